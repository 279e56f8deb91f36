use clap::Parser;
use tracing_subscriber::EnvFilter;

use rdhcpd::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "rdhcpd exited");
        std::process::exit(1);
    }
}
