// Vocalis entry point

use clap::Parser;
use vocalis_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for per-analyzer output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    vocalis_lib::run(cli).await
}
