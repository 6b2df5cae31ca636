use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{GenerateError, Result};
use crate::models::{Requirement, Scenario};
use crate::render::{
    marker_requirement, render_test_source, test_file_name, test_file_stem, RenderOptions,
};

const LOCK_FILE_NAME: &str = ".testgen.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const SCENARIO_FILE_SUFFIX: &str = "-scenarios.json";

/// A requirement record that could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Position in the input array (0-based)
    pub index: usize,
    /// Requirement id, when the record had a readable one
    pub id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "record #{} ({}): {}", self.index + 1, id, self.message),
            None => write!(f, "record #{}: {}", self.index + 1, self.message),
        }
    }
}

/// Requirements read from an input file
#[derive(Debug, Default)]
pub struct LoadedRequirements {
    pub requirements: Vec<Requirement>,
    /// Position of each kept requirement in the input array
    pub indices: Vec<usize>,
    pub rejected: Vec<RecordError>,
}

/// Loads a JSON array of requirements.
///
/// A missing file or a document that is not a JSON array is an error. Bad
/// individual records are collected in `rejected` and the rest are kept.
pub fn load_requirements<P: AsRef<Path>>(path: P) -> Result<LoadedRequirements> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GenerateError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&content).map_err(|e| GenerateError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut loaded = LoadedRequirements::default();
    let mut seen = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let id = record
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let requirement: Requirement = match serde_json::from_value(record) {
            Ok(r) => r,
            Err(e) => {
                loaded.rejected.push(RecordError {
                    index,
                    id,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if let Err(e) = requirement.validate() {
            loaded.rejected.push(RecordError {
                index,
                id,
                message: e.to_string(),
            });
            continue;
        }

        // Ids that differ only in case or punctuation share output files
        if !seen.insert(test_file_stem(&requirement.id)) {
            loaded.rejected.push(RecordError {
                index,
                id,
                message: "duplicate requirement id".to_string(),
            });
            continue;
        }

        loaded.requirements.push(requirement);
        loaded.indices.push(index);
    }

    for rejected in &loaded.rejected {
        warn!(path = %path.display(), "skipping {}", rejected);
    }

    Ok(loaded)
}

/// Name of the scenario file for a requirement, built from the same
/// sanitized stem as its test files
pub fn scenario_file_name(requirement_id: &str) -> String {
    format!("{}{}", test_file_stem(requirement_id), SCENARIO_FILE_SUFFIX)
}

/// Writes `contents` to a temporary sibling and renames it over `path`, so
/// readers never see a truncated file
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| GenerateError::io(&parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let write_result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(GenerateError::io(&tmp_path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(GenerateError::io(path, e));
    }

    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Save scenarios as a pretty-printed JSON array
pub fn persist_scenarios<P: AsRef<Path>>(scenarios: &[Scenario], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(scenarios)?;
    write_atomically(path.as_ref(), json.as_bytes())
}

/// Render a scenario and write it into `directory`, replacing any previous
/// version. Returns the written path.
pub fn persist_rendered_test<P: AsRef<Path>>(
    scenario: &Scenario,
    directory: P,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let source = render_test_source(scenario, options)?;
    let path = directory
        .as_ref()
        .join(test_file_name(&scenario.id, &options.extension));
    write_atomically(&path, source.as_bytes())?;
    Ok(path)
}

/// Removes generated test files of `requirement_id` in `directory` that are
/// not in `keep`. Hand-written files (no generated marker) are never touched.
pub fn prune_stale_tests(
    directory: &Path,
    requirement_id: &str,
    extension: &str,
    keep: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let suffix = format!(".{}", extension);
    let keep: HashSet<&Path> = keep.iter().map(|p| p.as_path()).collect();
    let mut removed = Vec::new();

    let entries = fs::read_dir(directory).map_err(|e| GenerateError::io(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| GenerateError::io(directory, e))?;
        let path = entry.path();

        let is_candidate = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix));
        if !is_candidate || keep.contains(path.as_path()) {
            continue;
        }

        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        if marker_requirement(&content) != Some(requirement_id) {
            continue;
        }

        fs::remove_file(&path).map_err(|e| GenerateError::io(&path, e))?;
        debug!(path = %path.display(), "removed stale generated test");
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}

/// A scenario file found on disk
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub path: PathBuf,
    pub scenarios: Vec<Scenario>,
}

impl ScenarioFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lists `*-scenarios.json` files in `directory`, sorted by name. Files that
/// fail to parse are skipped with a warning.
pub fn list_scenario_files<P: AsRef<Path>>(directory: P) -> Result<Vec<ScenarioFile>> {
    let directory = directory.as_ref();
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let entries = fs::read_dir(directory).map_err(|e| GenerateError::io(directory, e))?;
    for entry in entries {
        let path = entry.map_err(|e| GenerateError::io(directory, e))?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SCENARIO_FILE_SUFFIX));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|e| GenerateError::io(&path, e))?;
        match serde_json::from_str::<Vec<Scenario>>(&content) {
            Ok(scenarios) => files.push(ScenarioFile { path, scenarios }),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable scenario file"),
        }
    }

    Ok(files)
}

/// Exclusive advisory lock on an output directory, released on drop
#[derive(Debug)]
pub struct OutputLock {
    _file: File,
    path: PathBuf,
}

impl OutputLock {
    /// Acquire the lock for `directory`, waiting up to five seconds
    pub fn acquire(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory).map_err(|e| GenerateError::io(directory, e))?;
        let path = directory.join(LOCK_FILE_NAME);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| GenerateError::io(&path, e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        return Err(GenerateError::Locked(path));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(GenerateError::io(&path, e)),
            }
        }

        // Lock holder info, for debugging only
        let holder = file.set_len(0).and_then(|()| {
            writeln!(
                file,
                "Locked by PID {} at {}",
                std::process::id(),
                chrono::Utc::now().to_rfc3339()
            )
        });
        if let Err(e) = holder {
            debug!(path = %path.display(), error = %e, "could not record lock holder");
        }

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
