use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{GenerateError, Result};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "TESTGEN_CONFIG";

/// Project-local configuration file name
pub const LOCAL_CONFIG_FILE: &str = "testgen.yaml";

static ENV_VAR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env var pattern is valid"));

/// Names of the environment variables that hold the login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialVars {
    pub username_var: String,
    pub password_var: String,
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            username_var: "DC_USERNAME".to_string(),
            password_var: "DC_PASSWORD".to_string(),
        }
    }
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Where `<req-id>-scenarios.json` files go
    pub scenarios_dir: PathBuf,
    /// Where rendered test files go
    pub tests_dir: PathBuf,
    /// Test file extension, without the leading dot
    pub test_extension: String,
    /// Application name used in the synthetic login step
    pub application_name: String,
    /// Import path of the login page object, relative to the tests directory
    pub login_page_import: String,
    pub credentials: CredentialVars,
    /// Remove previously generated test files a requirement no longer produces
    pub prune_stale: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from("scenarios"),
            tests_dir: PathBuf::from("tests"),
            test_extension: "spec.ts".to_string(),
            application_name: "the application".to_string(),
            login_page_import: "../pages/LoginPage".to_string(),
            credentials: CredentialVars::default(),
            prune_stale: true,
        }
    }
}

impl GeneratorConfig {
    /// Loads the configuration from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;

        let config: GeneratorConfig = serde_yaml::from_str(&content).map_err(|e| {
            GenerateError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves and loads the configuration.
    ///
    /// An explicit path wins, then `TESTGEN_CONFIG`, then `./testgen.yaml`,
    /// then the user config directory. Defaults apply when none exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match find_config_path(explicit)? {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                Self::load(path)
            }
            None => {
                debug!("no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save the configuration to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| GenerateError::Config(format!("failed to serialize: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| GenerateError::io(path, e))
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("credentials.username_var", &self.credentials.username_var),
            ("credentials.password_var", &self.credentials.password_var),
        ] {
            if !ENV_VAR_NAME.is_match(value) {
                return Err(GenerateError::Config(format!(
                    "{} must be an environment variable name, got '{}'",
                    field, value
                )));
            }
        }

        if self.test_extension.is_empty() || self.test_extension.starts_with('.') {
            return Err(GenerateError::Config(format!(
                "test_extension must be non-empty and have no leading dot, got '{}'",
                self.test_extension
            )));
        }

        Ok(())
    }
}

/// Gets the path to the user-level configuration file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("testgen").join("config.yaml"))
}

fn find_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(GenerateError::NotFound(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(GenerateError::NotFound(path));
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(user_config_path().filter(|path| path.exists()))
}
