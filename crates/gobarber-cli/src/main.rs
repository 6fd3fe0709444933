//! GoBarber CLI - a terminal front end for the GoBarber scheduling backend.
//!
//! Sign in once, then check the day's appointments, browse the month's
//! availability and keep your profile up to date. The session survives
//! between runs.

mod app;
mod prompt;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gobarber_core::Config;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Parser, Debug)]
#[command(name = "gobarber", version, about = "GoBarber provider client")]
struct Cli {
    /// Backend base URL (overrides config and GOBARBER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Signin {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Create a new account
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Request a password recovery email
    ForgotPassword {
        #[arg(long)]
        email: Option<String>,
    },
    /// Edit name, email and optionally password
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        change_password: bool,
    },
    /// Upload a new avatar image
    Avatar { file: PathBuf },
    /// Show the appointments of a day (default: today)
    Schedule {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show which days of a month are bookable (default: this month)
    Calendar {
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM-DD, got {}", s))
}

fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got {}", s))
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by RUST_LOG (default `warn`). With a log
/// directory configured a daily rolling file is written as well; the returned
/// guard must stay alive until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "gobarber.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?.with_env_overrides();
    if let Some(url) = cli.api_url.clone() {
        config.api_url = Some(url);
    }

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(api_url = config.api_base_url(), storage = ?config.storage, "GoBarber CLI starting");

    let mut app = App::new(config)?;
    debug!(command = ?cli.command, authenticated = app.is_authenticated(), "Dispatching");

    match cli.command {
        Command::Signin { email } => app.sign_in(email).await,
        Command::Signout => app.sign_out(),
        Command::Whoami => app.whoami(),
        Command::Signup { name, email } => app.sign_up(name, email).await,
        Command::ForgotPassword { email } => app.forgot_password(email).await,
        Command::Profile {
            name,
            email,
            change_password,
        } => app.edit_profile(name, email, change_password).await,
        Command::Avatar { file } => app.change_avatar(&file).await,
        Command::Schedule { date } => app.schedule(date).await,
        Command::Calendar { month } => app.calendar(month).await,
    }
}
