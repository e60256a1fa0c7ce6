//! Visitdesk CLI entry point.
//!
//! Every command builds one [`App`], restores the stored session and then
//! talks to the server through the stores. Logs go to a file so command
//! output on stdout stays clean.

mod commands;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use visitdesk_engine::App;

use crate::commands::{BatchFilter, ChatAction};

#[derive(Parser)]
#[command(name = "visitdesk", about = "Campus visit scheduling client", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL, overriding the config file.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session.
    Login {
        email: String,
        #[arg(long, env = "VISITDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// List tours visible to the signed-in role.
    Tours {
        /// Only tours on this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// List tour request batches.
    Batches {
        #[arg(long, conflicts_with = "approved")]
        pending: bool,
        #[arg(long)]
        approved: bool,
    },
    /// Show or change the weekly availability grid.
    Availability {
        #[command(subcommand)]
        action: Option<AvailabilityAction>,
    },
    /// List fairs.
    Fairs,
    /// Chats and live messages.
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Resolve a path through the route guard.
    Navigate { path: String },
}

#[derive(Subcommand)]
enum AvailabilityAction {
    /// Flip one cell, e.g. `toggle tue 2`.
    Toggle { day: String, slot: u8 },
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mixing logs into command output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // ~/.visitdesk/logs/visitdesk.log
    if let Some(dir) = visitdesk_engine::config::config_dir() {
        candidates.push(dir.join("logs").join("visitdesk.log"));
    }

    candidates.push(PathBuf::from(".visitdesk").join("logs").join("visitdesk.log"));

    candidates
}

fn build_app(api_url: Option<&str>) -> anyhow::Result<App> {
    let Some(url) = api_url else {
        return Ok(App::load()?);
    };
    let mut settings = visitdesk_engine::VisitdeskConfig::load()?
        .unwrap_or_default()
        .resolve()?;
    let overridden = visitdesk_engine::Settings::for_base_url(url)?;
    settings.api_base_url = overridden.api_base_url;
    settings.ws_base_url = overridden.ws_base_url;
    Ok(App::new(settings)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "visitdesk starting");

    let mut app = build_app(cli.api_url.as_deref())?;

    let result = match cli.command {
        Commands::Login { email, password } => {
            commands::login(&mut app, &email, &password).await
        }
        Commands::Logout => commands::logout(&mut app).await,
        Commands::Whoami => commands::whoami(&mut app).await,
        Commands::Tours { date } => commands::tours(&mut app, date.as_deref()).await,
        Commands::Batches { pending, approved } => {
            let filter = if pending {
                BatchFilter::Pending
            } else if approved {
                BatchFilter::Approved
            } else {
                BatchFilter::All
            };
            commands::batches(&mut app, filter).await
        }
        Commands::Availability { action: None } => commands::availability(&mut app).await,
        Commands::Availability {
            action: Some(AvailabilityAction::Toggle { day, slot }),
        } => commands::toggle_availability(&mut app, &day, slot).await,
        Commands::Fairs => commands::fairs(&mut app).await,
        Commands::Chat { action } => commands::chat(&mut app, action).await,
        Commands::Navigate { path } => commands::navigate(&mut app, &path).await,
    };

    for event in app.drain_events() {
        commands::report_event(&event);
    }
    result
}
