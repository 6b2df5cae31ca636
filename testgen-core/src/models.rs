use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{GenerateError, Result};

static REQUIREMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^REQ-\d+$").expect("requirement id pattern is valid"));

/// Represents the priority of a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for RequirementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementPriority::High => write!(f, "high"),
            RequirementPriority::Medium => write!(f, "medium"),
            RequirementPriority::Low => write!(f, "low"),
        }
    }
}

fn default_module() -> String {
    "general".to_string()
}

/// A requirement record as written by analysts in the requirements file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Identifier in the `REQ-<digits>` format
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Functional area (Policy, Claims, Billing, ...)
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    pub priority: RequirementPriority,
}

impl Requirement {
    /// Creates a requirement with the default module and priority
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            acceptance_criteria: Vec::new(),
            module: default_module(),
            priority: RequirementPriority::default(),
        }
    }

    /// Checks the fields the generator cannot work without
    pub fn validate(&self) -> Result<()> {
        let label = if self.id.trim().is_empty() {
            "<unnamed>".to_string()
        } else {
            self.id.clone()
        };

        for (field, value) in [
            ("id", &self.id),
            ("title", &self.title),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(GenerateError::InvalidInput {
                    requirement: label,
                    field,
                });
            }
        }

        if self
            .id
            .chars()
            .any(|c| c.is_control() || c == '\u{2028}' || c == '\u{2029}')
        {
            return Err(GenerateError::InvalidId(self.id.clone()));
        }

        Ok(())
    }

    /// Whether the id follows the `REQ-<digits>` convention
    pub fn has_conventional_id(&self) -> bool {
        REQUIREMENT_ID.is_match(&self.id)
    }

    /// The module tag, falling back to `general` when blank
    pub fn module_tag(&self) -> &str {
        if self.module.trim().is_empty() {
            "general"
        } else {
            &self.module
        }
    }

    /// Example record used by `create-requirement`
    pub fn example() -> Self {
        Self {
            id: "REQ-XXX".to_string(),
            title: "Your requirement title".to_string(),
            description: "Detailed description".to_string(),
            acceptance_criteria: vec!["Criteria 1".to_string(), "Criteria 2".to_string()],
            module: "Policy|Claims|Billing".to_string(),
            priority: RequirementPriority::High,
        }
    }
}

/// Which member of a requirement's scenario family a scenario is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    HappyPath,
    /// Negative scenario for the n-th acceptance criterion (1-based)
    Negative(usize),
    Edge,
}

impl ScenarioKind {
    /// Suffix appended to the requirement id to form the scenario id
    pub fn suffix(&self) -> String {
        match self {
            ScenarioKind::HappyPath => "HAPPY_PATH".to_string(),
            ScenarioKind::Negative(n) => format!("NEG_{}", n),
            ScenarioKind::Edge => "EDGE".to_string(),
        }
    }

    pub fn scenario_id(&self, requirement_id: &str) -> String {
        format!("{}_{}", requirement_id, self.suffix())
    }

    pub fn step_kind(&self) -> StepKind {
        match self {
            ScenarioKind::HappyPath => StepKind::Positive,
            ScenarioKind::Negative(_) => StepKind::Negative,
            ScenarioKind::Edge => StepKind::Edge,
        }
    }
}

/// Flavour of the final synthesized step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Positive,
    Negative,
    Edge,
}

/// Structured data attached to a step.
///
/// Credentials are carried as environment variable names only; there is no
/// way to store a credential value in a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepData {
    Credentials {
        username_var: String,
        password_var: String,
    },
}

/// A single numbered step of a scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// 1-based position within the scenario
    pub step: usize,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StepData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// A generated test scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// `<requirementId>_<KIND>`
    pub id: String,
    pub requirement_id: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<Step>,
    pub expected_result: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<BTreeMap<String, String>>,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
