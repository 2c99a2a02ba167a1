//! Libris CLI - session and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Log in as the demo member
//! libris login -e user@library.com -p user123
//!
//! # Show the current session
//! libris whoami
//!
//! # Ask the route guard about a client route
//! libris guard /admin
//!
//! # Search the catalog
//! libris search "the hobbit" --limit 5
//!
//! # Inspect a session token
//! libris token decode eyJ...
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session lifecycle
//! - `guard` - Route-guard decision for a path
//! - `search`, `book` - Open Library lookups
//! - `token decode` - Token claims and validity

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "libris")]
#[command(author, version, about = "Libris session and catalog tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session for later commands
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a member account and log in
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (8+ characters, upper, lower, and a digit)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// End the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Show the route-guard decision for a client path
    Guard {
        /// Client path, e.g. `/admin`
        path: String,

        /// Location recorded before being sent to login
        #[arg(long)]
        next: Option<String>,
    },
    /// Search the catalog
    Search {
        /// Search terms
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show a work by id, or an edition by ISBN
    Book {
        /// Work id (`OL45804W`) or ISBN with `--isbn`
        id: String,

        /// Treat the id as an ISBN
        #[arg(long)]
        isbn: bool,
    },
    /// Inspect session tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Decode a token's claims and check whether it would be accepted
    Decode {
        /// The token string
        token: String,
    },
}

#[tokio::main]
async fn main() {
    // Command output goes through tracing, so default to info
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Login { email, password } => commands::session::login(&email, &password).await,
        Commands::Register {
            email,
            password,
            name,
        } => commands::session::register(&email, &password, &name).await,
        Commands::Logout => commands::session::logout().await,
        Commands::Whoami => commands::session::whoami().await,
        Commands::Guard { path, next } => commands::session::guard(&path, next.as_deref()).await,
        Commands::Search { query, limit } => commands::books::search(&query, limit).await,
        Commands::Book { id, isbn } => commands::books::book(&id, isbn).await,
        Commands::Token { action } => match action {
            TokenAction::Decode { token } => commands::token::decode(&token),
        },
    }
}
