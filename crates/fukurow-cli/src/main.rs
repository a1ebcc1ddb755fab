//! Fukurow EL CLI main entry point

use anyhow::Result;
use clap::Parser;
use fukurow_cli::{
    commands::{Cli, CommandExecutor},
    interactive::start_interactive,
};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut executor = CommandExecutor::new();

    // Ctrl+C stops the running saturation
    let cancel = executor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling saturation");
            cancel.cancel();
        }
    });

    // No arguments provided, start interactive mode
    if std::env::args().len() == 1 {
        start_interactive(executor).await?;
        return Ok(());
    }

    let cli = Cli::parse();
    let result = executor.execute(cli).await?;

    // Exit with appropriate code
    if result.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
