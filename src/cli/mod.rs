//! CLI entry point for the session tools.

pub mod session;

use clap::{Parser, Subcommand};

/// Fanhub session CLI
#[derive(Parser, Debug)]
#[command(name = "fanhub", version, about = "Fanhub session management")]
pub struct Cli {
    /// API base URL (overrides FANHUB_API_URL and config.toml)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Sign out and wipe the stored session
    Logout,
    /// Show the stored session
    Status,
    /// Mint a new access token from the stored refresh token
    Refresh,
    /// Verify the stored session with the server
    Check,
}

/// Arguments for `fanhub login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password (prompted on stdin when omitted)
    #[arg(long, env = "FANHUB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
