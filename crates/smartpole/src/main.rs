mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smartpole_config::{AeadCipher, FileStore};
use smartpole_core::Dashboard;

use crate::cli::{Cli, Command, ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Reading the file needs no cipher key
        Command::Config(ConfigArgs {
            command: ConfigCommand::Show,
        }) => commands::config_cmd::show(&cli.global),

        cmd => {
            let dashboard = open_dashboard(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &dashboard, &cli.global).await
        }
    }
}

/// Wire the file store and the password cipher into a [`Dashboard`].
fn open_dashboard(global: &GlobalOpts) -> Result<Dashboard, CliError> {
    let store = Arc::new(FileStore::resolve(global.config.clone()));
    let cipher = Arc::new(AeadCipher::resolve()?);
    tracing::debug!(path = %store.path().display(), "using configuration file");
    Ok(Dashboard::new(store, cipher))
}
