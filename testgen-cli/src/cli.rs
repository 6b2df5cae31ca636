use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Generate end-to-end test scenarios and Playwright tests from requirements",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Path to a testgen.yaml configuration file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate test scenarios and tests from a requirements file
    Generate {
        /// JSON file containing an array of requirements
        requirements_file: PathBuf,
    },

    /// List all generated scenarios
    ListScenarios,

    /// Show the requirement format, or build one interactively
    CreateRequirement {
        /// Prompt for each field and print the resulting JSON
        #[clap(long, short = 'i')]
        interactive: bool,
    },

    /// Generate random test data (policy, claim, customer, endorsement, billing)
    GenerateData {
        /// Kind of record to generate
        kind: String,

        /// Number of records
        #[clap(long, short = 'n', default_value_t = 10)]
        count: usize,

        /// Output file (defaults to test-data/<kind>s.json)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show this help message
    Help,
}
