//! HealthDesk terminal front end.
//!
//! Reads questions from stdin and prints the assistant's rendered replies.
//! Lines starting with `/` are commands, see [`HELP`]. Without a chat
//! endpoint only the commands are available.

use std::path::Path;

use anyhow::{bail, Context, Result};
use sqlx::sqlite::SqlitePool;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use healthdesk_core::assistant::{render_chat_message, ChatSession, HistoryStore};
use healthdesk_core::config::{AppConfig, ENV_CHAT_URL};
use healthdesk_core::database::{self, init_db, Table};
use healthdesk_core::export::{write_pdf, TableExport};
use healthdesk_core::models::{Message, Sender};
use healthdesk_core::storage::ObjectStore;

const HELP: &str = "Commands:
  /history               show the conversation
  /clear                 forget the conversation
  /summary               latest reading and average per health metric
  /export <table>        write a PDF of doctors, medications, prescriptions,
                         reports, appointments or metrics
  /delete <table> <id>   delete a record, with its uploaded file if any
  /quit                  exit";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs);
    info!(version = env!("CARGO_PKG_VERSION"), "HealthDesk starting");

    let paths = config.paths();
    paths
        .init()
        .context("Failed to initialize the data directory")?;
    let pool = init_db(&paths.db_path())
        .await
        .context("Failed to initialize database")?;
    let objects = ObjectStore::from_config(&config);

    let history = HistoryStore::new(pool.clone());
    let mut session = ChatSession::from_config(&config, history.clone()).await?;

    match session {
        Some(_) => println!("HealthDesk assistant. Ask a health question, or /help."),
        None => println!("HealthDesk records. Set {ENV_CHAT_URL} to enable the assistant; /help for commands."),
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/clear", _) => {
                match session.as_mut() {
                    Some(session) => session.clear().await?,
                    None => history.clear().await?,
                }
                println!("Conversation cleared.");
            }
            ("/history", _) => match session.as_ref() {
                Some(session) => print_history(session.history())?,
                None => print_history(&history.load().await?)?,
            },
            ("/summary", _) => print_summary(&pool).await?,
            ("/export", table) => match export_table(&pool, table.trim(), &paths.exports_dir()).await {
                Ok(path) => println!("Exported to {}", path.display()),
                Err(e) => {
                    error!(error = %e, "Export failed");
                    println!("Export failed: {e}");
                }
            },
            ("/delete", args) => match delete_command(&pool, &objects, args).await {
                Ok(()) => println!("Deleted."),
                Err(e) => {
                    error!(error = %e, "Delete failed");
                    println!("Delete failed: {e}");
                }
            },
            (command, _) if command.starts_with('/') => {
                println!("Unknown command {command}.\n{HELP}")
            }
            _ => match session.as_mut() {
                Some(session) => match session.send(line).await {
                    Ok(reply) => println!("{}", session.render(&reply)?),
                    Err(e) => {
                        error!(error = %e, "Chat turn failed");
                        println!("Could not send your message: {e}");
                    }
                },
                None => println!("The assistant is disabled. Set {ENV_CHAT_URL} to chat."),
            },
        }
    }

    info!("HealthDesk stopped");
    Ok(())
}

fn print_history(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        println!("No messages yet.");
    }
    for message in messages {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        println!("[{who}] {}", render_chat_message(message)?);
    }
    Ok(())
}

async fn print_summary(pool: &SqlitePool) -> Result<()> {
    let overview = database::metric_overview(pool).await?;
    if overview.is_empty() {
        println!("No readings yet.");
    }
    for (metric_type, summary) in overview {
        println!(
            "{}: latest {} on {}, average {:.1} over {} readings",
            metric_type.label(),
            summary.latest.value,
            summary.latest.recorded_at.format("%Y-%m-%d"),
            summary.average,
            summary.count,
        );
    }
    Ok(())
}

async fn delete_command(pool: &SqlitePool, objects: &ObjectStore, args: &str) -> Result<()> {
    let Some((table, id)) = args.trim().split_once(' ') else {
        bail!("usage: /delete <table> <id>");
    };
    let id = id.trim();
    match table {
        "prescriptions" => database::delete_prescription(pool, objects, id).await?,
        "reports" => database::delete_report(pool, objects, id).await?,
        "doctors" => database::delete_record(pool, Table::Doctors, id).await?,
        "medications" => database::delete_record(pool, Table::Medications, id).await?,
        "appointments" => database::delete_record(pool, Table::Appointments, id).await?,
        "metrics" => database::delete_record(pool, Table::HealthMetrics, id).await?,
        other => bail!("unknown table '{other}'"),
    }
    Ok(())
}

async fn export_table(pool: &SqlitePool, table: &str, dir: &Path) -> Result<std::path::PathBuf> {
    let export = match table {
        "doctors" => TableExport::from_records("Doctors", &database::list_doctors(pool).await?),
        "medications" => {
            TableExport::from_records("Medications", &database::list_medications(pool).await?)
        }
        "prescriptions" => TableExport::from_records(
            "Prescriptions",
            &database::list_prescriptions(pool).await?,
        ),
        "reports" => TableExport::from_records("Reports", &database::list_reports(pool).await?),
        "appointments" => TableExport::from_records(
            "Appointments",
            &database::list_appointments(pool).await?,
        ),
        "metrics" => TableExport::from_records(
            "Health Metrics",
            &database::list_health_metrics(pool, None).await?,
        ),
        other => bail!("unknown table '{other}'"),
    };
    Ok(write_pdf(&export, dir).await?)
}
