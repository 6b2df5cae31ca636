mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use testgen_core::{
    list_scenario_files, save_fixtures, FixtureGenerator, FixtureKind, GeneratorConfig, Pipeline,
    Requirement,
};

use crate::cli::{Cli, Command};

/// Environment variable holding a tracing filter, e.g. `testgen_core=debug`
const LOG_ENV_VAR: &str = "TESTGEN_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Some(Command::Generate { requirements_file }) => {
            let config = load_config(cli.config.as_deref())?;
            generate_from_file(config, requirements_file)?;
        }
        Some(Command::ListScenarios) => {
            let config = load_config(cli.config.as_deref())?;
            list_scenarios(&config)?;
        }
        Some(Command::CreateRequirement { interactive }) => {
            create_requirement(*interactive)?;
        }
        Some(Command::GenerateData {
            kind,
            count,
            output,
        }) => {
            generate_data(kind, *count, output.as_deref())?;
        }
        Some(Command::Help) | None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<GeneratorConfig> {
    GeneratorConfig::resolve(explicit).context("Failed to load configuration")
}

fn generate_from_file(config: GeneratorConfig, path: &Path) -> Result<()> {
    println!("Loading requirements from: {}", path.display());

    let pipeline = Pipeline::new(config);
    let report = pipeline
        .generate_from_file(path)
        .with_context(|| format!("Failed to generate from {}", path.display()))?;

    let total = report.outputs.len();
    for (index, output) in report.outputs.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing: {} - {}",
            index + 1,
            total,
            output.requirement_id.bold(),
            output.title
        );
        println!("  Generated {} scenarios", output.scenario_count);
        println!("  {} {}", "✓".green(), output.scenario_file.display());
        for test_file in &output.test_files {
            println!("  {} {}", "✓".green(), test_file.display());
        }
        for pruned in &output.pruned {
            println!("  {} {} (stale)", "✗".yellow(), pruned.display());
        }
    }

    if !report.skipped.is_empty() {
        println!("\n{}", "Skipped requirements:".yellow());
        for skipped in &report.skipped {
            println!("  {}", skipped);
        }
    }

    let config = pipeline.config();
    println!(
        "\n{}",
        format!(
            "Complete! Generated {} total scenarios and Playwright tests",
            report.total_scenarios()
        )
        .green()
    );
    println!("  Scenarios saved to: {}", config.scenarios_dir.display());
    println!("  Tests saved to: {}", config.tests_dir.display());

    Ok(())
}

fn list_scenarios(config: &GeneratorConfig) -> Result<()> {
    let files = list_scenario_files(&config.scenarios_dir)
        .with_context(|| format!("Failed to read {}", config.scenarios_dir.display()))?;

    if files.is_empty() {
        println!("{}", "No scenarios found. Generate some first!".yellow());
        return Ok(());
    }

    println!("\nFound {} scenario files:\n", files.len());
    for file in files {
        println!("  {}", file.file_name().bold());
        println!("    └─ {} scenarios", file.scenarios.len());
        for scenario in &file.scenarios {
            println!("       • {}: {}", scenario.id.cyan(), scenario.title);
        }
        println!();
    }

    Ok(())
}

fn create_requirement(interactive: bool) -> Result<()> {
    if interactive {
        let requirement = prompts::prompt_new_requirement()?;
        println!("\n{}", "Requirement:".green());
        println!("{}", serde_json::to_string_pretty(&requirement)?);
        println!("\nAdd this object to a requirements file, then run `testgen generate <file>`.");
        return Ok(());
    }

    println!("\nCreate New Requirement\n");
    println!("Add requirement objects to a JSON array file, for example scenarios/requirements.json,");
    println!("or run `testgen create-requirement --interactive`.");
    println!("\nExample format:");
    println!("{}", serde_json::to_string_pretty(&Requirement::example())?);
    Ok(())
}

fn generate_data(kind: &str, count: usize, output: Option<&Path>) -> Result<()> {
    let kind: FixtureKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("test-data").join(kind.default_file_name()));

    let fixtures = FixtureGenerator::default().batch(kind, count);
    save_fixtures(&fixtures, &path)
        .with_context(|| format!("Failed to save test data to {}", path.display()))?;

    println!(
        "{} Saved {} {} records to: {}",
        "✓".green(),
        fixtures.len(),
        kind,
        path.display()
    );
    Ok(())
}
