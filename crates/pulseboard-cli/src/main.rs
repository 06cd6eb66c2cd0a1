//! PulseBoard CLI - diagnostics for social sign-in and backend sessions.

mod commands;
mod output;

use auth_engine::Provider;
use clap::{Parser, Subcommand};
use client_config_and_utils::{init_logging, parse_level, LogConfig, Paths};

/// PulseBoard CLI - Inspect configuration, test the token exchange, and manage
/// the stored backend session.
#[derive(Parser)]
#[command(name = "pulseboard")]
#[command(about = "PulseBoard CLI for sign-in diagnostics and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Trade a Kakao or Naver access token for a backend session token
    Exchange {
        /// Provider that issued the access token (kakao or naver)
        #[arg(short, long)]
        provider: Provider,
        /// Provider access token
        #[arg(short, long, env = "PULSEBOARD_ACCESS_TOKEN")]
        access_token: String,
    },

    /// Exchange a Kakao or Naver access token and sign in with the result
    Redeem {
        /// Provider that issued the access token (kakao or naver)
        #[arg(short, long)]
        provider: Provider,
        /// Provider access token
        #[arg(short, long, env = "PULSEBOARD_ACCESS_TOKEN")]
        access_token: String,
    },

    /// Show the stored session
    Status {
        /// Confirm the session with the backend
        #[arg(long)]
        validate: bool,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Permanently delete the signed-in account
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Load and validate the configuration file
    Check,
}

fn init_cli_logging(level: &str) {
    let log_path = Paths::new().ok().map(|paths| paths.log_file());
    let result = init_logging(LogConfig {
        service_name: "cli".into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path,
        also_stderr: false,
    });

    if let Err(e) = result {
        eprintln!("Warning: logging disabled: {}", e);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_cli_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Check => commands::config_check(&cli.format),
        },
        Commands::Exchange {
            provider,
            access_token,
        } => commands::exchange(provider, &access_token, &cli.format).await,
        Commands::Redeem {
            provider,
            access_token,
        } => commands::redeem(provider, &access_token, &cli.format).await,
        Commands::Status { validate } => commands::status(validate, &cli.format).await,
        Commands::Logout => commands::logout(&cli.format),
        Commands::DeleteAccount { yes } => commands::delete_account(yes, &cli.format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}
