//! Task Manager
//!
//! Command-line front end for a personal task list stored in SQLite.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use task_manager::cli::{App, Cli, error_report};
use task_manager::config::Config;
use task_manager::format::{self, OutputFormat};
use task_manager::logging::{self, LogTarget};
use tracing::{debug, error};

fn run(cli: Cli) -> Result<String> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    let target = LogTarget::parse(&cli.log, &config.paths.logs_dir());
    logging::init(&target, logging::build_filter(&config.logging.level, cli.verbose))?;
    debug!(?config, "Configuration loaded");

    config.ensure_dirs()?;
    let mut app = App::open(config)?;
    let output = app.execute(cli.command)?;
    Ok(output.render(cli.format)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output_format = cli.format;

    match run(cli) {
        Ok(text) => {
            if !text.is_empty() {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            let report = error_report(&err);
            match output_format {
                OutputFormat::Json => match format::to_json(&report) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("Error: {}", report.message),
                },
                OutputFormat::Text => eprintln!("Error: {}", report.message),
            }
            ExitCode::FAILURE
        }
    }
}
