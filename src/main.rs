// ABOUTME: Entry point for the jobledger binary.
// ABOUTME: Initializes tracing, loads configuration, and prints ledger contents as JSON lines.

mod config;

use anyhow::{Context, bail};
use jobledger_core::SyncBookmark;
use jobledger_store::{Database, EventLedger, JobStateStore, RecordStore};

use crate::config::LedgerConfig;

const USAGE: &str = "usage:
  jobledger events-since <job_id> [since_ms] [excluded_id ...]
  jobledger job-states";

/// A parsed command line.
#[derive(Debug)]
enum Command {
    EventsSince { job_id: String, bookmark: SyncBookmark },
    JobStates,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        match args.next().as_deref() {
            Some("events-since") => {
                let Some(job_id) = args.next() else {
                    bail!("missing job_id\n{USAGE}");
                };
                let since_time = match args.next() {
                    Some(raw) => raw
                        .parse::<i64>()
                        .with_context(|| format!("since_ms must be an integer, got {raw:?}"))?,
                    None => 0,
                };
                Ok(Command::EventsSince {
                    job_id,
                    bookmark: SyncBookmark {
                        since_time,
                        seen_ids: args.collect(),
                    },
                })
            }
            Some("job-states") => Ok(Command::JobStates),
            _ => bail!("{USAGE}"),
        }
    }
}

/// Run a command against the database and return the output lines.
fn run(db: &Database, command: Command) -> anyhow::Result<Vec<String>> {
    let tx = db.unit_of_work()?;
    let mut lines = Vec::new();

    match command {
        Command::EventsSince {
            job_id,
            mut bookmark,
        } => {
            for event in EventLedger.poll(&tx, &job_id, &mut bookmark)? {
                lines.push(EventLedger.to_api_output(&event)?.to_string());
            }
            tracing::info!(
                "next bookmark for {}: {}",
                job_id,
                serde_json::to_string(&bookmark)?
            );
        }
        Command::JobStates => {
            for state in JobStateStore.all(&tx)? {
                lines.push(JobStateStore.to_api_output(&state)?.to_string());
            }
        }
    }

    Ok(lines)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jobledger=info")),
        )
        .init();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = LedgerConfig::from_env()?;
    tracing::debug!("using database {}", config.db_path.display());

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?
        .with_busy_timeout(config.busy_timeout);

    let lines = tokio::task::spawn_blocking(move || run(&db, command)).await??;
    for line in lines {
        println!("{line}");
    }

    Ok(())
}
