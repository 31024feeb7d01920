//! Mapspec CLI - command-line interface for declarative JSON mapping
//!
//! This is the main entry point for the `mapspec` binary, providing
//! commands for listing, showing, validating and running mapping
//! specifications stored in a mappings directory.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;
mod store;

use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

fn main() {
    let cli = Cli::parse_args();

    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error::format_error(&e, false));
            process::exit(e.exit_code());
        }
    };

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let format = output_format(&cli, &config);
    let mut output = OutputWriter::new(format, use_color, cli.quiet);

    match run(cli, &config, &mut output) {
        Ok(()) => process::exit(0),
        Err(e) => {
            if let Err(report_error) = output.failure(&e) {
                eprintln!("{}", error::format_error(&report_error, use_color));
            }
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
fn run(cli: Cli, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("cli_execution");
    let store = handlers::open_store(cli.mappings_dir.as_deref(), config);

    tracing::info!(
        verbosity = cli.verbosity_level(),
        mappings_dir = %store.dir().display(),
        "Executing command"
    );

    match cli.command {
        Commands::List(args) => handlers::handle_list(args, &store, output),
        Commands::Show(args) => handlers::handle_show(args, &store, output),
        Commands::Run(args) => handlers::handle_run(args, config, &store, std::io::stdin().lock(), output),
        Commands::Validate(args) => handlers::handle_validate(args, output),
    }
}

/// Command-line format, then the configured one
fn output_format(cli: &Cli, config: &Config) -> OutputFormat {
    cli.output
        .or_else(|| config.output_format().ok())
        .unwrap_or(OutputFormat::Human)
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level(), &config.logging.level);
    if let Ok(format) = config.log_format() {
        if cli.verbosity_level() < 3 {
            logging_config.format = format;
        }
    }
    logging_config.ansi = control::SHOULD_COLORIZE.should_colorize();

    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
