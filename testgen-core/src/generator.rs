//! Scenario generation
//!
//! Expands one requirement into a fixed family of scenarios:
//! - one happy-path scenario
//! - one negative scenario per acceptance criterion, in list order
//! - one edge-case scenario
//!
//! Generation is deterministic; the same requirement always yields the same
//! scenarios.

use tracing::{debug, warn};

use crate::config::{CredentialVars, GeneratorConfig};
use crate::error::{GenerateError, Result};
use crate::intent::{criterion_reads_as_constraint, find_inline_credential, is_login_text};
use crate::models::{Requirement, Scenario, ScenarioKind, Step, StepData, StepKind};

/// Tag added to negative scenarios whose criterion describes a success
/// rather than a rule to violate
pub const NEEDS_REVIEW_TAG: &str = "needs-review";

/// Turns requirements into scenarios
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    /// Name used in the synthetic login step
    application_name: String,
    /// Environment variables referenced by credential placeholders
    credentials: CredentialVars,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl ScenarioGenerator {
    pub fn new(application_name: impl Into<String>, credentials: CredentialVars) -> Self {
        Self {
            application_name: application_name.into(),
            credentials,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.application_name.clone(), config.credentials.clone())
    }

    /// Generate the scenario family for a requirement
    pub fn generate_scenarios(&self, requirement: &Requirement) -> Result<Vec<Scenario>> {
        requirement.validate()?;
        reject_inline_credentials(requirement)?;

        if !requirement.has_conventional_id() {
            warn!(
                id = %requirement.id,
                "requirement id does not follow the REQ-<digits> convention"
            );
        }

        let mut scenarios = Vec::with_capacity(requirement.acceptance_criteria.len() + 2);
        scenarios.push(self.happy_path_scenario(requirement));
        for (index, criterion) in requirement.acceptance_criteria.iter().enumerate() {
            scenarios.push(self.negative_scenario(requirement, index + 1, criterion));
        }
        scenarios.push(self.edge_case_scenario(requirement));

        debug!(
            id = %requirement.id,
            count = scenarios.len(),
            "generated scenarios"
        );
        Ok(scenarios)
    }

    fn happy_path_scenario(&self, requirement: &Requirement) -> Scenario {
        let kind = ScenarioKind::HappyPath;
        Scenario {
            id: kind.scenario_id(&requirement.id),
            requirement_id: requirement.id.clone(),
            title: format!("{} - Happy Path", requirement.title),
            description: format!(
                "Verify {} works correctly with valid data",
                requirement.description
            ),
            steps: self.build_steps(&requirement.description, kind.step_kind()),
            expected_result: "Operation completes successfully".to_string(),
            tags: vec![
                "happy-path".to_string(),
                requirement.module_tag().to_string(),
                requirement.priority.to_string(),
            ],
            test_data: None,
        }
    }

    fn negative_scenario(
        &self,
        requirement: &Requirement,
        number: usize,
        criterion: &str,
    ) -> Scenario {
        let kind = ScenarioKind::Negative(number);
        let id = kind.scenario_id(&requirement.id);

        let mut tags = vec![
            "negative".to_string(),
            "validation".to_string(),
            requirement.module_tag().to_string(),
        ];
        if !criterion_reads_as_constraint(criterion) {
            warn!(
                scenario = %id,
                criterion,
                "acceptance criterion reads as a success outcome; negative scenario needs review"
            );
            tags.push(NEEDS_REVIEW_TAG.to_string());
        }

        Scenario {
            id,
            requirement_id: requirement.id.clone(),
            title: format!("{} - Validation: {}", requirement.title, criterion),
            description: format!("Verify system handles invalid data: {}", criterion),
            steps: self.build_steps(criterion, kind.step_kind()),
            expected_result: "System displays appropriate error message".to_string(),
            tags,
            test_data: None,
        }
    }

    fn edge_case_scenario(&self, requirement: &Requirement) -> Scenario {
        let kind = ScenarioKind::Edge;
        Scenario {
            id: kind.scenario_id(&requirement.id),
            requirement_id: requirement.id.clone(),
            title: format!("{} - Edge Cases", requirement.title),
            description: format!("Test boundary conditions for {}", requirement.description),
            steps: self.build_steps(&requirement.description, kind.step_kind()),
            expected_result: "System handles edge cases appropriately".to_string(),
            tags: vec![
                "edge-case".to_string(),
                requirement.module_tag().to_string(),
            ],
            test_data: None,
        }
    }

    /// Synthesize the ordered steps for a description.
    ///
    /// Descriptions that are not themselves about logging in get a login
    /// step and a navigation step first. Step numbers are assigned last so
    /// they are always `1..=len`.
    pub fn build_steps(&self, description: &str, kind: StepKind) -> Vec<Step> {
        let is_login = is_login_text(description);
        let mut steps = Vec::new();

        if !is_login {
            steps.push(Step {
                step: 0,
                action: format!("Login to {}", self.application_name),
                data: Some(self.credential_data()),
                expected: Some("User successfully logged in".to_string()),
            });
            steps.push(Step {
                step: 0,
                action: "Navigate to relevant module".to_string(),
                data: None,
                expected: Some("Module page loads successfully".to_string()),
            });
        }

        let last = match (kind, is_login) {
            (StepKind::Positive, true) => Step {
                step: 0,
                action: description.to_string(),
                data: Some(self.credential_data()),
                expected: Some("User successfully logged in".to_string()),
            },
            (StepKind::Positive, false) => Step {
                step: 0,
                action: format!("Perform action: {}", description),
                data: None,
                expected: Some("Action completes successfully".to_string()),
            },
            (StepKind::Negative, true) => Step {
                step: 0,
                action: format!("Attempt {} with invalid data", description),
                data: None,
                expected: Some("Error message displayed".to_string()),
            },
            (StepKind::Negative, false) => Step {
                step: 0,
                action: format!("Attempt action with invalid data: {}", description),
                data: None,
                expected: Some("Error message displayed".to_string()),
            },
            (StepKind::Edge, true) => Step {
                step: 0,
                action: "Test login boundary conditions".to_string(),
                data: None,
                expected: Some("System handles edge case".to_string()),
            },
            (StepKind::Edge, false) => Step {
                step: 0,
                action: format!("Test boundary condition: {}", description),
                data: None,
                expected: Some("System handles edge case".to_string()),
            },
        };
        steps.push(last);

        for (index, step) in steps.iter_mut().enumerate() {
            step.step = index + 1;
        }
        steps
    }

    fn credential_data(&self) -> StepData {
        StepData::Credentials {
            username_var: self.credentials.username_var.clone(),
            password_var: self.credentials.password_var.clone(),
        }
    }
}

/// Requirement text is copied into scenario titles, steps and comments, so a
/// quoted credential in it would end up in every generated file
fn reject_inline_credentials(requirement: &Requirement) -> Result<()> {
    let texts = [&requirement.title, &requirement.description]
        .into_iter()
        .chain(requirement.acceptance_criteria.iter());

    for text in texts {
        if let Some(field) = find_inline_credential(text) {
            return Err(GenerateError::SecretLeak {
                origin: requirement.id.clone(),
                field,
            });
        }
    }
    Ok(())
}
