//! Batch generation: requirements file in, scenario files and test files out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::generator::ScenarioGenerator;
use crate::models::Requirement;
use crate::render::{render_test_source, test_file_name, test_file_stem, RenderOptions};
use crate::storage::{
    load_requirements, persist_scenarios, prune_stale_tests, scenario_file_name,
    write_atomically, OutputLock, RecordError,
};

/// Files produced for one requirement
#[derive(Debug, Clone)]
pub struct RequirementOutput {
    pub requirement_id: String,
    pub title: String,
    pub scenario_count: usize,
    pub scenario_file: PathBuf,
    pub test_files: Vec<PathBuf>,
    /// Generated tests from earlier runs that this run no longer produces
    pub pruned: Vec<PathBuf>,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<RequirementOutput>,
    /// Records rejected while loading or generating
    pub skipped: Vec<RecordError>,
}

impl BatchReport {
    pub fn total_scenarios(&self) -> usize {
        self.outputs.iter().map(|o| o.scenario_count).sum()
    }
}

/// Generates and writes scenarios and tests according to a configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: GeneratorConfig,
    generator: ScenarioGenerator,
    render_options: RenderOptions,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            generator: ScenarioGenerator::from_config(&config),
            render_options: RenderOptions::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Load a requirements file and generate everything it describes.
    ///
    /// Nothing is written when the file is missing or is not a JSON array.
    pub fn generate_from_file<P: AsRef<Path>>(&self, path: P) -> Result<BatchReport> {
        let loaded = load_requirements(path)?;
        let items = loaded
            .indices
            .iter()
            .copied()
            .zip(loaded.requirements.iter())
            .collect();
        let mut report = self.run(items)?;

        let mut skipped = loaded.rejected;
        skipped.append(&mut report.skipped);
        skipped.sort_by_key(|r| r.index);
        report.skipped = skipped;
        Ok(report)
    }

    /// Generate scenarios and tests for each requirement in order.
    ///
    /// Requirements that fail validation, contain inline credentials, or
    /// would share output files with an earlier requirement are skipped and
    /// reported. Filesystem errors abort the batch.
    pub fn generate_batch(&self, requirements: &[Requirement]) -> Result<BatchReport> {
        self.run(requirements.iter().enumerate().collect())
    }

    fn run(&self, requirements: Vec<(usize, &Requirement)>) -> Result<BatchReport> {
        let _lock = OutputLock::acquire(&self.config.scenarios_dir)?;
        let mut report = BatchReport::default();
        let mut stems = HashSet::new();

        for (index, requirement) in requirements {
            if !stems.insert(test_file_stem(&requirement.id)) {
                warn!(id = %requirement.id, "skipping requirement with duplicate id");
                report.skipped.push(RecordError {
                    index,
                    id: Some(requirement.id.clone()),
                    message: "duplicate requirement id".to_string(),
                });
                continue;
            }

            match self.generate_requirement(requirement) {
                Ok(output) => {
                    info!(
                        id = %output.requirement_id,
                        scenarios = output.scenario_count,
                        "generated requirement"
                    );
                    report.outputs.push(output);
                }
                Err(
                    e @ (GenerateError::InvalidInput { .. }
                    | GenerateError::InvalidId(_)
                    | GenerateError::SecretLeak { .. }),
                ) => {
                    warn!(id = %requirement.id, error = %e, "skipping requirement");
                    report.skipped.push(RecordError {
                        index,
                        id: Some(requirement.id.clone()),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Generate and write one requirement's scenarios and tests.
    ///
    /// Every test is rendered before anything is written, so a rejected
    /// requirement leaves no files behind.
    pub fn generate_requirement(&self, requirement: &Requirement) -> Result<RequirementOutput> {
        let scenarios = self.generator.generate_scenarios(requirement)?;

        let mut rendered = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            let source = render_test_source(scenario, &self.render_options)?;
            let path = self
                .config
                .tests_dir
                .join(test_file_name(&scenario.id, &self.render_options.extension));
            rendered.push((path, source));
        }

        let scenario_file = self
            .config
            .scenarios_dir
            .join(scenario_file_name(&requirement.id));
        persist_scenarios(&scenarios, &scenario_file)?;

        let mut test_files = Vec::with_capacity(rendered.len());
        for (path, source) in rendered {
            write_atomically(&path, source.as_bytes())?;
            test_files.push(path);
        }

        let pruned = if self.config.prune_stale {
            prune_stale_tests(
                &self.config.tests_dir,
                &requirement.id,
                &self.render_options.extension,
                &test_files,
            )?
        } else {
            Vec::new()
        };

        Ok(RequirementOutput {
            requirement_id: requirement.id.clone(),
            title: requirement.title.clone(),
            scenario_count: scenarios.len(),
            scenario_file,
            test_files,
            pruned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> GeneratorConfig {
        GeneratorConfig {
            scenarios_dir: dir.path().join("scenarios"),
            tests_dir: dir.path().join("tests"),
            ..GeneratorConfig::default()
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    const REQUIREMENTS: &str = r#"[
        {
            "id": "REQ-002",
            "title": "Create New Policy",
            "description": "create a new policy",
            "acceptance_criteria": ["Policy number must be unique", "Effective date cannot be in the past"],
            "module": "Policy",
            "priority": "high"
        },
        {"id": "REQ-003", "title": "Broken"},
        {"id": "REQ-004", "title": "Secret", "description": "use token 'abcdefgh12345'"}
    ]"#;

    #[test]
    fn test_generate_from_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("requirements.json");
        fs::write(&input, REQUIREMENTS).unwrap();
        let pipeline = Pipeline::new(config_in(&dir));

        let report = pipeline.generate_from_file(&input).unwrap();

        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.total_scenarios(), 4);
        let skipped: Vec<(usize, Option<&str>)> = report
            .skipped
            .iter()
            .map(|r| (r.index, r.id.as_deref()))
            .collect();
        assert_eq!(skipped, vec![(1, Some("REQ-003")), (2, Some("REQ-004"))]);

        assert_eq!(
            file_names(&dir.path().join("tests")),
            vec![
                "req-002-edge.spec.ts",
                "req-002-happy-path.spec.ts",
                "req-002-neg-1.spec.ts",
                "req-002-neg-2.spec.ts",
            ]
        );
        assert_eq!(
            file_names(&dir.path().join("scenarios")),
            vec![".testgen.lock", "req-002-scenarios.json"]
        );
    }

    #[test]
    fn test_regeneration_is_safe() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("requirements.json");
        fs::write(&input, REQUIREMENTS).unwrap();
        let pipeline = Pipeline::new(config_in(&dir));

        pipeline.generate_from_file(&input).unwrap();
        let tests_dir = dir.path().join("tests");
        let first: Vec<String> = file_names(&tests_dir)
            .iter()
            .map(|n| fs::read_to_string(tests_dir.join(n)).unwrap())
            .collect();

        pipeline.generate_from_file(&input).unwrap();
        let second: Vec<String> = file_names(&tests_dir)
            .iter()
            .map(|n| fs::read_to_string(tests_dir.join(n)).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(file_names(&tests_dir).len(), 4);
    }

    #[test]
    fn test_dropped_criterion_prunes_its_test() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config_in(&dir));
        let mut req = Requirement::new("REQ-002", "Create New Policy", "create a new policy");
        req.acceptance_criteria = vec![
            "Policy number must be unique".to_string(),
            "Effective date cannot be in the past".to_string(),
        ];
        pipeline.generate_batch(std::slice::from_ref(&req)).unwrap();

        req.acceptance_criteria.pop();
        let report = pipeline.generate_batch(std::slice::from_ref(&req)).unwrap();

        let tests_dir = dir.path().join("tests");
        assert_eq!(report.outputs[0].pruned, vec![tests_dir.join("req-002-neg-2.spec.ts")]);
        assert_eq!(
            file_names(&tests_dir),
            vec![
                "req-002-edge.spec.ts",
                "req-002-happy-path.spec.ts",
                "req-002-neg-1.spec.ts",
            ]
        );
    }

    #[test]
    fn test_pruning_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.prune_stale = false;
        let pipeline = Pipeline::new(config);

        let mut req = Requirement::new("REQ-005", "Bill", "pay a bill");
        req.acceptance_criteria = vec!["Amount must be positive".to_string()];
        pipeline.generate_batch(std::slice::from_ref(&req)).unwrap();

        req.acceptance_criteria.clear();
        let report = pipeline.generate_batch(std::slice::from_ref(&req)).unwrap();

        assert!(report.outputs[0].pruned.is_empty());
        assert!(dir.path().join("tests").join("req-005-neg-1.spec.ts").exists());
    }

    #[test]
    fn test_case_variant_ids_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("requirements.json");
        fs::write(
            &input,
            r#"[
                {
                    "id": "REQ-002",
                    "title": "Create Policy",
                    "description": "create a new policy",
                    "acceptance_criteria": ["Policy number must be unique", "Effective date cannot be in the past"]
                },
                {"id": "req-002", "title": "Cancel Policy", "description": "cancel a policy"}
            ]"#,
        )
        .unwrap();
        let pipeline = Pipeline::new(config_in(&dir));

        let report = pipeline.generate_from_file(&input).unwrap();

        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id.as_deref(), Some("req-002"));

        let happy = fs::read_to_string(dir.path().join("tests").join("req-002-happy-path.spec.ts"))
            .unwrap();
        assert!(happy.contains("test.describe('Create Policy - Happy Path'"));
        let scenarios =
            fs::read_to_string(dir.path().join("scenarios").join("req-002-scenarios.json")).unwrap();
        assert!(scenarios.contains("Create Policy"));
        assert!(!scenarios.contains("Cancel Policy"));
    }

    #[test]
    fn test_batch_skips_ids_sharing_file_names() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config_in(&dir));
        let requirements = vec![
            Requirement::new("REQ-002", "Create Policy", "create a new policy"),
            Requirement::new("REQ_002", "Renew Policy", "renew a policy"),
        ];

        let report = pipeline.generate_batch(&requirements).unwrap();

        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].title, "Create Policy");
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[0].message, "duplicate requirement id");
    }

    #[test]
    fn test_path_like_ids_stay_in_output_dirs() {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig {
            scenarios_dir: dir.path().join("out").join("scenarios"),
            tests_dir: dir.path().join("out").join("tests"),
            ..GeneratorConfig::default()
        };
        let pipeline = Pipeline::new(config);
        let req = Requirement::new("../../escaped", "Escape", "write elsewhere");

        let output = pipeline.generate_requirement(&req).unwrap();

        assert_eq!(
            output.scenario_file,
            dir.path().join("out").join("scenarios").join("------escaped-scenarios.json")
        );
        assert!(output.scenario_file.exists());
        assert!(!dir.path().join("escaped-scenarios.json").exists());
        assert!(output
            .test_files
            .iter()
            .all(|p| p.parent() == Some(dir.path().join("out").join("tests").as_path())));
    }

    #[test]
    fn test_malformed_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("requirements.json");
        fs::write(&input, "not json").unwrap();
        let pipeline = Pipeline::new(config_in(&dir));

        assert!(matches!(
            pipeline.generate_from_file(&input),
            Err(GenerateError::Parse { .. })
        ));
        assert!(!dir.path().join("scenarios").exists());
        assert!(!dir.path().join("tests").exists());
    }
}
