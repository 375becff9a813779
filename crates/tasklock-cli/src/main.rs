//! Entry point for the `tasklock` binary.

use std::process::ExitCode;

use clap::Parser;
use tasklock_cli::{AppConfig, Cli, execute, logging};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let configuration = AppConfig::load(cli.config.as_deref(), cli.database_url.clone())?;
    let _logging_guard = logging::init_logging(&configuration.logging)?;

    match execute(cli.command, &configuration).await {
        Ok(code) => Ok(ExitCode::from(code)),
        Err(e) => {
            error!(error = %e, "tasklock failed");
            Err(e)
        }
    }
}
