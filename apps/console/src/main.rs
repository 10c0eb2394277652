//! # Libris Console Entry Point
//!
//! `libris` is a command-line front-end for library staff.
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Initialize tracing (logging)
//! 3. Load `ClientConfig` (defaults → libris.toml → env → flags)
//! 4. Connect a `Library` (REST server, or SQLite with `--demo`)
//! 5. Run the command and print tables/notices
//!
//! ## Examples
//! ```bash
//! libris --demo login librarian --password librarian
//! libris --demo books list --search tolkien
//! libris --demo issue --book 3 --member 2
//! libris --demo return 7
//! libris --demo dashboard
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libris_client::{ClientConfig, ClientError, Library};

mod commands;
mod output;

use commands::{auth, books, config, loans, members, reports, Outcome};

/// Library administration from the terminal.
#[derive(Parser, Debug)]
#[command(name = "libris", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: per-user config directory)
    #[arg(long, global = true, env = "LIBRIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the local demo backend instead of the REST server
    #[arg(long, global = true)]
    pub demo: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login(auth::LoginArgs),

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Create a staff account
    Register(auth::RegisterArgs),

    /// Manage the catalogue
    #[command(subcommand)]
    Books(books::BooksCommand),

    /// Manage members
    #[command(subcommand)]
    Members(members::MembersCommand),

    /// Issue a book to a member
    Issue(loans::IssueArgs),

    /// Return an issued book
    Return(loans::ReturnArgs),

    /// List open loans
    Active,

    /// List overdue loans
    Overdue,

    /// Show library counters
    Dashboard,

    /// Counters plus the overdue report
    Reports,

    /// Show or write the client configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome, ClientError> {
    let mut client_config = ClientConfig::load(cli.config.clone())?;
    if cli.demo {
        client_config.demo.enabled = true;
    }
    // Each invocation is a new process, so the demo data needs a file
    if client_config.demo.enabled && client_config.demo.database_path.is_none() {
        client_config.demo.database_path = ClientConfig::default_demo_db_path();
    }

    // Config commands work without a backend
    if let Command::Config(cmd) = &cli.command {
        return config::run(cmd, &client_config, cli.config.clone(), cli.json);
    }

    let library = Library::connect(&client_config).await?;
    let json = cli.json;

    let result = match cli.command {
        Command::Login(args) => auth::login(&library, args, json).await,
        Command::Logout => auth::logout(&library).await,
        Command::Whoami => auth::whoami(&library, json).await,
        Command::Register(args) => auth::register(&library, args, json).await,
        Command::Books(cmd) => books::run(&library, cmd, json).await,
        Command::Members(cmd) => members::run(&library, cmd, json).await,
        Command::Issue(args) => loans::issue(&library, args, json).await,
        Command::Return(args) => loans::return_book(&library, args, json).await,
        Command::Active => loans::active(&library, json).await,
        Command::Overdue => reports::overdue(&library, json).await,
        Command::Dashboard => reports::dashboard(&library, json).await,
        Command::Reports => reports::full(&library, json).await,
        Command::Config(_) => Ok(Outcome::Done),
    };

    library.shutdown().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=libris=trace` - Show trace for libris crates only
/// - Default: INFO level, written to stderr
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,libris=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
