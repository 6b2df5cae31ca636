use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading requirements, generating scenarios and
/// writing generated files.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A requirement record is missing a mandatory field
    #[error("invalid requirement {requirement}: {field} must not be empty")]
    InvalidInput {
        requirement: String,
        field: &'static str,
    },

    /// Requirement id cannot be written into a generated file header
    #[error("invalid requirement id {0:?}: line breaks and control characters are not allowed")]
    InvalidId(String),

    /// Input file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input file is not a JSON array of records
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Filesystem error at a specific path
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output directory is locked by another generator run
    #[error("timeout waiting for lock on {} - another generation may be running", .0.display())]
    Locked(PathBuf),

    /// Requirement text or rendered output contains a literal credential
    #[error("refusing to generate {origin}: text contains a literal credential near '{field}'")]
    SecretLeak { origin: String, field: String },

    /// Configuration file is unreadable or invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
