//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Mapspec CLI - declarative JSON-to-JSON mapping with an audit trail
///
/// Lists, inspects, validates and runs mapping specifications stored in a
/// mappings directory.
#[derive(Parser, Debug)]
#[command(
    name = "mapspec",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MAPSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory holding mapping specifications
    #[arg(long, global = true, env = "MAPSPEC_MAPPINGS_DIR", value_name = "DIR")]
    pub mappings_dir: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the mapping specifications in the mappings directory
    List(ListArgs),

    /// Print one mapping specification by name
    Show(ShowArgs),

    /// Map an input document through a named specification
    Run(RunArgs),

    /// Check that a specification file parses and report its shape
    Validate(ValidateArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Parse each specification and show field, rule and profile counts
    #[arg(long)]
    pub details: bool,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Specification name (file stem inside the mappings directory)
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Specification name (file stem inside the mappings directory)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Input document (JSON or YAML); reads stdin when absent or `-`
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Profile to apply on top of the base mapping
    #[arg(short, long, env = "MAPSPEC_PROFILE")]
    pub profile: Option<String>,

    /// Include the audit log in the output
    #[arg(long)]
    pub show_log: bool,

    /// Also write the JSON report to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the specification file (JSON or YAML)
    #[arg(value_name = "SPEC_FILE")]
    pub file: PathBuf,

    /// List profile names and their overridden sections
    #[arg(long)]
    pub detailed: bool,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl OutputFormat {
    /// Parse a configured format name such as `json-pretty`
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }

    /// Whether this format is meant for other programs
    pub fn is_machine(self) -> bool {
        !matches!(self, OutputFormat::Human)
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
