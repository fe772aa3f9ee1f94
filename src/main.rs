//! Fanhub CLI binary entry point.

use clap::Parser;
use fanhub_session::cli::session::{self, CliContext};
use fanhub_session::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ctx = match CliContext::load(cli.api_url) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Login(args) => session::handle_login(&ctx, args).await,
        Commands::Logout => session::handle_logout(&ctx).await,
        Commands::Status => session::handle_status(&ctx).await,
        Commands::Refresh => session::handle_refresh(&ctx).await,
        Commands::Check => session::handle_check(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
