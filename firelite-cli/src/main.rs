//! Command-line front end for the firelite microVM supervisor.
//!
//! Parses the flag set into [`firelite::VmOptions`], then hands off to
//! [`firelite::launch`], which assembles the configuration, provisions
//! transient resources, launches the VMM, and supervises it to exit.
//! Teardown of everything provisioned is guaranteed before the process
//! exits, on success and on every failure path.

mod cli;

use clap::{CommandFactory, Parser};
use cli::Cli;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // With no arguments at all, print usage instead of a required-flag error.
    if std::env::args_os().len() <= 1 {
        let mut command = Cli::command();
        command.print_help()?;
        return Ok(());
    }

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let options = cli.into_options();
    let cancel = CancellationToken::new();

    if let Err(error) = firelite::launch(&options, cancel).await {
        tracing::error!(%error, "VM run failed");
        return Err(error.into());
    }

    Ok(())
}

/// Logs go to stderr so the VMM keeps the terminal's stdout to itself.
fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
