mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use bullion_core::BullionConfig;
use clap::Parser;
use tracing::warn;

use crate::cli::Cli;
use crate::error::CliError;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    // `.env` may set the log filter, so it is read before logging starts.
    let dotenv_problem = dotenv_warning(dotenvy::dotenv());
    logging::init();
    if let Some(problem) = dotenv_problem {
        warn!(%problem, "ignoring .env");
    }
    let cli = Cli::parse();

    let mut config = BullionConfig::from_env()?;
    if let Some(db_path) = &cli.db_path {
        config.warehouse.db_path = db_path.clone();
    }
    if let Some(provider) = cli.provider {
        config.provider = provider.into();
    }

    let envelope = commands::run(&cli, &config)?;
    output::render(&envelope, cli.format, cli.pretty)?;

    if cli.strict && (!envelope.meta.warnings.is_empty() || !envelope.errors.is_empty()) {
        return Err(CliError::StrictModeViolation {
            warning_count: envelope.meta.warnings.len(),
            error_count: envelope.errors.len(),
        });
    }

    if !envelope.errors.is_empty() {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}

/// A missing `.env` is normal; anything else is worth reporting.
fn dotenv_warning<T>(result: Result<T, dotenvy::Error>) -> Option<String> {
    match result {
        Err(error) if !error.not_found() => Some(error.to_string()),
        _ => None,
    }
}
