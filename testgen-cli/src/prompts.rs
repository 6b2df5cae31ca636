use anyhow::Result;
use inquire::{Editor, Select, Text};

use testgen_core::{Requirement, RequirementPriority};

/// Prompts the user for a new requirement
pub fn prompt_new_requirement() -> Result<Requirement> {
    let id = Text::new("ID (REQ-<digits>):").prompt()?;
    let title = Text::new("Title:").prompt()?;

    // Use the Editor type for multiline input
    let description = Editor::new("Description:").prompt()?;

    let mut req = Requirement::new(id.trim(), title.trim(), description.trim());

    // Collect acceptance criteria until an empty answer
    loop {
        let prompt = format!(
            "Acceptance criterion #{} (leave empty to finish):",
            req.acceptance_criteria.len() + 1
        );
        let criterion = Text::new(&prompt).prompt()?;
        let criterion = criterion.trim();
        if criterion.is_empty() {
            break;
        }
        req.acceptance_criteria.push(criterion.to_string());
    }

    let module = Text::new("Module:")
        .with_default("general")
        .with_help_message("Policy, Claims, Billing, ...")
        .prompt()?;
    req.module = module.trim().to_string();

    let priority_options = vec![
        RequirementPriority::High,
        RequirementPriority::Medium,
        RequirementPriority::Low,
    ];
    req.priority = Select::new("Priority:", priority_options)
        .with_starting_cursor(1)
        .prompt()?;

    req.validate()?;
    Ok(req)
}
