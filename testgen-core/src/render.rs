//! Renders scenarios into Playwright test source.
//!
//! Only login steps become real calls (through the `LoginPage` page object).
//! Every other step is emitted as a placeholder comment for a person to
//! implement. Credentials are always `process.env.<VAR>` expressions.

use crate::config::{CredentialVars, GeneratorConfig};
use crate::error::{GenerateError, Result};
use crate::generator::NEEDS_REVIEW_TAG;
use crate::intent::{find_inline_credential, is_login_text};
use crate::models::{Scenario, Step, StepData};

const MARKER_PREFIX: &str = "// @generated by testgen from ";
const MARKER_SUFFIX: &str = "; regenerating overwrites this file";

/// Inputs to rendering that would otherwise come from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Variables used when a login step carries no credential data
    pub credentials: CredentialVars,
    /// Module specifier of the login page object
    pub login_page_import: String,
    /// File extension without the leading dot
    pub extension: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            credentials: config.credentials.clone(),
            login_page_import: config.login_page_import.clone(),
            extension: config.test_extension.clone(),
        }
    }
}

/// First line of every rendered file
pub fn generated_marker(requirement_id: &str) -> String {
    format!("{}{}{}", MARKER_PREFIX, requirement_id, MARKER_SUFFIX)
}

/// Requirement id recorded in a generated file's marker line, if the text
/// was produced by this renderer
pub fn marker_requirement(source: &str) -> Option<&str> {
    source
        .lines()
        .next()?
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)
}

/// File stem for a scenario: lower-cased id with every character outside
/// `[a-z0-9]` replaced by `-`
pub fn test_file_stem(scenario_id: &str) -> String {
    scenario_id
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub fn test_file_name(scenario_id: &str, extension: &str) -> String {
    format!("{}.{}", test_file_stem(scenario_id), extension)
}

/// Render a scenario into a self-contained test file.
///
/// Fails with [`GenerateError::SecretLeak`] if the output would contain a
/// quoted credential literal, which can only come from requirement text.
pub fn render_test_source(scenario: &Scenario, options: &RenderOptions) -> Result<String> {
    let has_login_step = scenario.steps.iter().any(|s| is_login_text(&s.action));

    let mut out = String::new();
    out.push_str(&generated_marker(&scenario.requirement_id));
    out.push('\n');
    out.push_str("import { test, expect } from '@playwright/test';\n");
    out.push_str(&format!(
        "import {{ LoginPage }} from '{}';\n",
        js_string(&options.login_page_import)
    ));
    out.push_str("import * as dotenv from 'dotenv';\n\n");
    out.push_str("dotenv.config();\n\n");

    out.push_str(&format!(
        "test.describe('{}', () => {{\n",
        js_string(&scenario.title)
    ));
    out.push_str(&format!(
        "  test('{}', async ({{ page }}) => {{\n",
        js_string(&scenario.id)
    ));
    out.push_str(&format!("    // Test: {}\n", comment(&scenario.description)));
    if scenario.has_tag(NEEDS_REVIEW_TAG) {
        out.push_str(
            "    // NOTE: the acceptance criterion describes a success outcome; review the expected result\n",
        );
    }

    if has_login_step {
        out.push_str("\n    const loginPage = new LoginPage(page);\n");
    }

    for step in &scenario.steps {
        out.push('\n');
        out.push_str(&format!("    // Step {}: {}\n", step.step, comment(&step.action)));
        out.push_str(&step_code(step, options));
        if let Some(expected) = &step.expected {
            out.push_str(&format!("    // Expected: {}\n", comment(expected)));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "    // Expected Result: {}\n",
        comment(&scenario.expected_result)
    ));
    out.push_str("  });\n");
    out.push_str("});\n");

    if let Some(field) = find_inline_credential(&out) {
        return Err(GenerateError::SecretLeak {
            origin: scenario.id.clone(),
            field,
        });
    }

    Ok(out)
}

fn step_code(step: &Step, options: &RenderOptions) -> String {
    if !is_login_text(&step.action) {
        return format!(
            "    // TODO: Implement step - {}\n    // await page.click('selector');\n",
            comment(&step.action)
        );
    }

    let (username, password) = match &step.data {
        Some(StepData::Credentials {
            username_var,
            password_var,
        }) => (
            format!("process.env.{}", username_var),
            format!("process.env.{}", password_var),
        ),
        None => (
            format!("process.env.{} || ''", options.credentials.username_var),
            format!("process.env.{} || ''", options.credentials.password_var),
        ),
    };

    format!(
        "    await loginPage.navigate();\n    await loginPage.login({}, {});\n",
        username, password
    )
}

/// Escape text for a single-quoted JavaScript string literal
fn js_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JavaScript line terminators
const LINE_TERMINATORS: [char; 4] = ['\r', '\n', '\u{2028}', '\u{2029}'];

/// Flatten text onto one line so it stays inside a `//` comment
fn comment(text: &str) -> String {
    text.split(LINE_TERMINATORS)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ScenarioGenerator;
    use crate::models::{Requirement, RequirementPriority};
    use pretty_assertions::assert_eq;

    fn scenario(id: &str, steps: Vec<Step>) -> Scenario {
        Scenario {
            id: id.to_string(),
            requirement_id: "REQ-002".to_string(),
            title: "Create New Policy - Happy Path".to_string(),
            description: "Verify create a new policy works correctly with valid data".to_string(),
            steps,
            expected_result: "Operation completes successfully".to_string(),
            tags: vec!["happy-path".to_string()],
            test_data: None,
        }
    }

    #[test]
    fn test_file_name_sanitization() {
        assert_eq!(test_file_stem("REQ-002_NEG_1"), "req-002-neg-1");
        assert_eq!(test_file_name("REQ-002_NEG_1", "spec.ts"), "req-002-neg-1.spec.ts");
        assert_eq!(test_file_stem("REQ-7_HAPPY_PATH"), "req-7-happy-path");
        assert_eq!(test_file_stem("Req 9/É"), "req-9--");
    }

    #[test]
    fn test_marker_round_trip() {
        let marker = generated_marker("REQ-002");
        let text = format!("{}\nimport x;\n", marker);
        assert_eq!(marker_requirement(&text), Some("REQ-002"));
        assert_eq!(marker_requirement("import x;\n"), None);
    }

    #[test]
    fn test_render_generated_happy_path() {
        let mut req = Requirement::new("REQ-002", "Create New Policy", "create a new policy");
        req.module = "Policy".to_string();
        req.priority = RequirementPriority::High;
        let scenarios = ScenarioGenerator::default().generate_scenarios(&req).unwrap();

        let source = render_test_source(&scenarios[0], &RenderOptions::default()).unwrap();

        let expected = "\
// @generated by testgen from REQ-002; regenerating overwrites this file
import { test, expect } from '@playwright/test';
import { LoginPage } from '../pages/LoginPage';
import * as dotenv from 'dotenv';

dotenv.config();

test.describe('Create New Policy - Happy Path', () => {
  test('REQ-002_HAPPY_PATH', async ({ page }) => {
    // Test: Verify create a new policy works correctly with valid data

    const loginPage = new LoginPage(page);

    // Step 1: Login to the application
    await loginPage.navigate();
    await loginPage.login(process.env.DC_USERNAME, process.env.DC_PASSWORD);
    // Expected: User successfully logged in

    // Step 2: Navigate to relevant module
    // TODO: Implement step - Navigate to relevant module
    // await page.click('selector');
    // Expected: Module page loads successfully

    // Step 3: Perform action: create a new policy
    // TODO: Implement step - Perform action: create a new policy
    // await page.click('selector');
    // Expected: Action completes successfully

    // Expected Result: Operation completes successfully
  });
});
";
        assert_eq!(source, expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let req = Requirement::new("REQ-004", "Claims", "file a claim");
        let scenarios = ScenarioGenerator::default().generate_scenarios(&req).unwrap();
        let options = RenderOptions::default();

        for scenario in &scenarios {
            assert_eq!(
                render_test_source(scenario, &options).unwrap(),
                render_test_source(scenario, &options).unwrap()
            );
        }
    }

    #[test]
    fn test_login_step_without_data_uses_default_vars() {
        let options = RenderOptions {
            credentials: CredentialVars {
                username_var: "APP_USER".to_string(),
                password_var: "APP_PASS".to_string(),
            },
            ..RenderOptions::default()
        };
        let s = scenario(
            "REQ-001_EDGE",
            vec![Step {
                step: 1,
                action: "Test login boundary conditions".to_string(),
                data: None,
                expected: Some("System handles edge case".to_string()),
            }],
        );

        let source = render_test_source(&s, &options).unwrap();
        assert!(source.contains("const loginPage = new LoginPage(page);"));
        assert!(source
            .contains("await loginPage.login(process.env.APP_USER || '', process.env.APP_PASS || '');"));
    }

    #[test]
    fn test_no_login_step_skips_page_object() {
        let s = scenario(
            "REQ-003_HAPPY_PATH",
            vec![Step {
                step: 1,
                action: "Open the dashboard".to_string(),
                data: None,
                expected: None,
            }],
        );

        let source = render_test_source(&s, &RenderOptions::default()).unwrap();
        assert!(!source.contains("new LoginPage"));
        assert!(source.contains("// TODO: Implement step - Open the dashboard"));
        assert!(!source.contains("// Expected: "));
    }

    #[test]
    fn test_titles_are_escaped() {
        let mut s = scenario("REQ-005_EDGE", Vec::new());
        s.title = "Customer's policy\nrenewal".to_string();

        let source = render_test_source(&s, &RenderOptions::default()).unwrap();
        assert!(source.contains("test.describe('Customer\\'s policy\\nrenewal', () => {"));
    }

    #[test]
    fn test_unicode_line_separators_stay_inside_comments() {
        let mut s = scenario(
            "REQ-007_HAPPY_PATH",
            vec![Step {
                step: 1,
                action: "Open quotes\u{2029}await page.goto('https://example.invalid')".to_string(),
                data: None,
                expected: None,
            }],
        );
        s.title = "Quote\u{2028}Request".to_string();
        s.description = "request a quote\u{2028}await page.goto('https://example.invalid')".to_string();

        let source = render_test_source(&s, &RenderOptions::default()).unwrap();
        assert!(!source.contains('\u{2028}'));
        assert!(!source.contains('\u{2029}'));
        assert!(source.contains(
            "    // Test: request a quote await page.goto('https://example.invalid')\n"
        ));
        assert!(source.contains("test.describe('Quote\\u2028Request', () => {"));
        assert!(source
            .lines()
            .all(|line| !line.trim_start().starts_with("await page.goto")));
    }

    #[test]
    fn test_sign_in_description_renders_login_call() {
        let req = Requirement::new("REQ-008", "Portal Access", "Sign in to the broker portal");
        let scenarios = ScenarioGenerator::default().generate_scenarios(&req).unwrap();
        let happy = &scenarios[0];
        assert_eq!(happy.steps.len(), 1);

        let source = render_test_source(happy, &RenderOptions::default()).unwrap();
        assert!(source.contains("    const loginPage = new LoginPage(page);\n"));
        assert!(source.contains(
            "    // Step 1: Sign in to the broker portal\n    await loginPage.navigate();\n    await loginPage.login(process.env.DC_USERNAME, process.env.DC_PASSWORD);\n"
        ));
        assert!(!source.contains("TODO: Implement step"));
    }

    #[test]
    fn test_generated_login_tests_never_inline_credentials() {
        let mut req = Requirement::new(
            "REQ-001",
            "User Login",
            "User should be able to login with valid credentials",
        );
        req.acceptance_criteria = vec![
            "Username is required".to_string(),
            "Password is required".to_string(),
            "Successful login redirects to home page".to_string(),
        ];
        let options = RenderOptions::default();

        for scenario in ScenarioGenerator::default().generate_scenarios(&req).unwrap() {
            let source = render_test_source(&scenario, &options).unwrap();
            assert!(source.contains("loginPage.login(process.env."));
            assert_eq!(find_inline_credential(&source), None);
        }
    }

    #[test]
    fn test_review_note_rendered() {
        let mut req = Requirement::new("REQ-001", "User Login", "log into the portal");
        req.acceptance_criteria = vec!["Successful login redirects to home page".to_string()];
        let scenarios = ScenarioGenerator::default().generate_scenarios(&req).unwrap();

        let source = render_test_source(&scenarios[1], &RenderOptions::default()).unwrap();
        assert!(source.contains("// NOTE: the acceptance criterion describes a success outcome"));
    }

    #[test]
    fn test_literal_credentials_are_refused() {
        let mut s = scenario("REQ-006_NEG_1", Vec::new());
        s.description = "Works with password 'Adm1nPassw0rd'".to_string();

        let result = render_test_source(&s, &RenderOptions::default());
        assert!(matches!(
            result,
            Err(GenerateError::SecretLeak { ref origin, .. }) if origin == "REQ-006_NEG_1"
        ));
    }
}
