//! E-library reader CLI
//!
//! Manage highlights and reading progress from the terminal against the
//! e-library backend.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use elibrary_client::{session, ApiClient};
use reader_types::DEFAULT_DASHBOARD_PERIOD;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::ExportFormat;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "elibrary-reader")]
#[command(version, about = "Highlights and reading progress for the e-library")]
struct Args {
    /// API root, e.g. https://library.example.edu/api
    #[arg(long, env = "ELIBRARY_API_URL", global = true)]
    api_url: Option<String>,

    /// Where the signed-in session is stored
    #[arg(long, env = "ELIBRARY_SESSION_FILE", global = true)]
    session_file: Option<PathBuf>,

    /// TOML config file (defaults to <config dir>/elibrary/reader.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ELIBRARY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Work with a book's highlights
    #[command(subcommand)]
    Highlights(HighlightsCommand),
    /// Show or set reading progress
    #[command(subcommand)]
    Progress(ProgressCommand),
    /// Reading session bookkeeping
    #[command(subcommand)]
    Session(SessionCommand),
    /// Show the reading streak
    Streak {
        /// Dashboard period, e.g. week or month
        #[arg(long, default_value = DEFAULT_DASHBOARD_PERIOD)]
        period: String,
    },
}

#[derive(Subcommand, Debug)]
enum HighlightsCommand {
    List {
        book_id: String,
    },
    Export {
        book_id: String,
        #[arg(long, value_enum, default_value = "markdown")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Delete {
        book_id: String,
        highlight_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ProgressCommand {
    Show {
        book_id: String,
    },
    Set {
        book_id: String,
        page: u32,
        #[arg(long)]
        total_pages: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Get the open session for a book, creating one if needed
    Start { book_id: String },
    Update {
        session_id: String,
        page: u32,
        #[arg(long)]
        pages_read: Option<u32>,
    },
    End { session_id: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(args.config.as_deref())?
        .with_overrides(args.api_url, args.session_file);
    let session_file = config.session_file()?;
    let stored = session_file.load()?;
    tracing::debug!(
        api = %config.api.base_url,
        session = %session_file.path().display(),
        authenticated = stored.is_authenticated(),
        "Configuration resolved"
    );

    let shared = session::shared(stored);
    let client = ApiClient::new(config.client_config(), shared.clone())?;
    let mut out = std::io::stdout().lock();

    match args.command {
        Command::Login { email, password } => {
            commands::login(&client, email, password, &mut out).await?;
            session_file.save(&session::snapshot(&shared))?;
        }
        Command::Logout => {
            commands::logout(&client, &mut out).await?;
            session_file.remove()?;
        }
        Command::Whoami => {
            commands::whoami(&client, &mut out).await?;
            session_file.save(&session::snapshot(&shared))?;
        }
        Command::Highlights(cmd) => match cmd {
            HighlightsCommand::List { book_id } => {
                commands::list_highlights(&client, &book_id, &mut out).await?
            }
            HighlightsCommand::Export {
                book_id,
                format,
                output: Some(path),
            } => {
                let mut file = std::fs::File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                commands::export_highlights(&client, &book_id, format, &mut file).await?;
                tracing::info!(path = %path.display(), "Exported highlights");
            }
            HighlightsCommand::Export {
                book_id,
                format,
                output: None,
            } => commands::export_highlights(&client, &book_id, format, &mut out).await?,
            HighlightsCommand::Delete {
                book_id,
                highlight_id,
            } => commands::delete_highlight(&client, &book_id, &highlight_id, &mut out).await?,
        },
        Command::Progress(cmd) => match cmd {
            ProgressCommand::Show { book_id } => {
                commands::show_progress(&client, &book_id, &mut out).await?
            }
            ProgressCommand::Set {
                book_id,
                page,
                total_pages,
            } => commands::set_progress(&client, &book_id, page, total_pages, &mut out).await?,
        },
        Command::Session(cmd) => match cmd {
            SessionCommand::Start { book_id } => {
                commands::start_session(&client, &book_id, &mut out).await?
            }
            SessionCommand::Update {
                session_id,
                page,
                pages_read,
            } => {
                commands::update_session(&client, &session_id, page, pages_read, &mut out).await?
            }
            SessionCommand::End { session_id } => {
                commands::end_session(&client, &session_id, &mut out).await?
            }
        },
        Command::Streak { period } => commands::show_streak(&client, &period, &mut out).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let args = Args::try_parse_from([
            "elibrary-reader",
            "highlights",
            "export",
            "42",
            "--format",
            "json",
        ])
        .unwrap();
        match args.command {
            Command::Highlights(HighlightsCommand::Export {
                book_id, format, ..
            }) => {
                assert_eq!(book_id, "42");
                assert_eq!(format, ExportFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_progress_set_flags() {
        let args = Args::try_parse_from([
            "elibrary-reader",
            "--api-url",
            "https://lib.example.edu/api",
            "progress",
            "set",
            "42",
            "17",
            "--total-pages",
            "300",
        ])
        .unwrap();
        assert_eq!(args.api_url.as_deref(), Some("https://lib.example.edu/api"));
        assert!(matches!(
            args.command,
            Command::Progress(ProgressCommand::Set {
                page: 17,
                total_pages: Some(300),
                ..
            })
        ));
    }

    #[test]
    fn test_streak_period_defaults_to_week() {
        let args = Args::try_parse_from(["elibrary-reader", "streak"]).unwrap();
        assert!(matches!(args.command, Command::Streak { ref period } if period == "week"));

        let args =
            Args::try_parse_from(["elibrary-reader", "streak", "--period", "month"]).unwrap();
        assert!(matches!(args.command, Command::Streak { ref period } if period == "month"));
    }
}
