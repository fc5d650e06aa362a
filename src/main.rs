use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use payoff::api::cli::{Cli, run};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse().command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
