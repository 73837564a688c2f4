//! Modguard driver.
//!
//! Reads one JSON event per line from stdin, runs the events concurrently
//! through the dispatcher and writes one JSON result per line to stdout.
//! Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use modguard::database::{ConfigStore, Database, MemoryStore, MongoStore};
use modguard::permissions::StaticAdminLookup;
use modguard::{Action, Config, Dispatcher, ModerationEvent};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// How often expired flood counters and unused cached records are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// One output line.
#[derive(Serialize)]
struct Outcome {
    line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actions: Option<Vec<Action>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

async fn process(dispatcher: &Dispatcher, line_no: u64, line: &str) -> Outcome {
    let event = match ModerationEvent::from_json(line) {
        Ok(event) => event,
        Err(e) => {
            warn!("Line {}: {}", line_no, e);
            return Outcome {
                line: line_no,
                chat_id: None,
                actions: None,
                error: Some(e.to_string()),
                retryable: Some(false),
            };
        }
    };

    match dispatcher.handle(&event).await {
        Ok(actions) => Outcome {
            line: line_no,
            chat_id: Some(event.chat_id),
            actions: Some(actions),
            error: None,
            retryable: None,
        },
        Err(e) => {
            error!("Line {} (chat {}): {}", line_no, event.chat_id, e);
            Outcome {
                line: line_no,
                chat_id: Some(event.chat_id),
                actions: None,
                retryable: Some(e.is_retryable()),
                error: Some(e.to_string()),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modguard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting modguard...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let store: Arc<dyn ConfigStore> = match &config.mongodb_uri {
        Some(uri) => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            info!("Database connected");
            Arc::new(MongoStore::new(&db))
        }
        None => {
            warn!("MONGODB_URI not set, configuration will not outlive this process");
            Arc::new(MemoryStore::new())
        }
    };

    if config.settings.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Owners: {:?}", config.settings.owner_ids);
    }

    let lookup = Arc::new(StaticAdminLookup::new(config.group_admins.iter().copied()));
    let dispatcher = Arc::new(Dispatcher::new(store, lookup, config.settings.clone()));

    // Single writer so concurrent results never interleave mid-line.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
            {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let mut prune = tokio::time::interval(PRUNE_INTERVAL);
    let mut line_no = 0u64;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }

                let dispatcher = Arc::clone(&dispatcher);
                let tx = tx.clone();
                let current = line_no;
                tasks.spawn(async move {
                    let outcome = process(&dispatcher, current, &line).await;
                    match serde_json::to_string(&outcome) {
                        Ok(json) => {
                            let _ = tx.send(json);
                        }
                        Err(e) => error!("Could not encode result for line {}: {}", current, e),
                    }
                });
            }
            _ = prune.tick() => {
                dispatcher.prune_flood();
                dispatcher.evict_idle();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, finishing in-flight events");
                break;
            }
        }

        // Reap finished tasks so the set does not grow with the input.
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    drop(tx);
    writer.await?;

    info!("Processed {} lines", line_no);
    Ok(())
}
