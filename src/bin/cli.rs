use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use portico_auth::create_access_token;
use portico_config::JwtConfig;
use serde_json::Map;

#[derive(Parser)]
#[command(name = "portico-cli")]
#[command(about = "Portico CLI - Administrative tools for Portico", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an access token with JWT_SECRET
    IssueToken {
        /// Subject stored in the `userId` claim
        #[arg(short = 'u', long)]
        user_id: String,

        /// Email stored in the `email` claim
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Lifetime in seconds (defaults to JWT_EXPIRES_IN)
        #[arg(long)]
        expires_in: Option<u64>,
    },
}

fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::IssueToken {
            user_id,
            email,
            expires_in,
        } => handle_issue_token(&user_id, email.as_deref(), expires_in),
    }
}

fn handle_issue_token(user_id: &str, email: Option<&str>, expires_in: Option<u64>) -> ExitCode {
    let mut config = match JwtConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid JWT configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(expires_in) = expires_in {
        config.expires_in = expires_in;
    }

    match create_access_token(user_id, email, Map::new(), &config) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error issuing token: {e}");
            ExitCode::FAILURE
        }
    }
}
