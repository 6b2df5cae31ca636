pub mod config;
pub mod error;
pub mod fixtures;
pub mod generator;
pub mod intent;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod storage;

// Re-export commonly used types
pub use config::{user_config_path, CredentialVars, GeneratorConfig, CONFIG_ENV_VAR};
pub use error::{GenerateError, Result};
pub use fixtures::{save_fixtures, Fixture, FixtureGenerator, FixtureKind};
pub use generator::{ScenarioGenerator, NEEDS_REVIEW_TAG};
pub use intent::{criterion_reads_as_constraint, find_inline_credential, is_login_text};
pub use models::{
    Requirement, RequirementPriority, Scenario, ScenarioKind, Step, StepData, StepKind,
};
pub use pipeline::{BatchReport, Pipeline, RequirementOutput};
pub use render::{render_test_source, test_file_name, test_file_stem, RenderOptions};
pub use storage::{
    list_scenario_files, load_requirements, persist_rendered_test, persist_scenarios,
    scenario_file_name, LoadedRequirements, RecordError, ScenarioFile,
};
