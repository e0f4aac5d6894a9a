//! exmon: live monitor runtime binary.
//! Keeps a WebSocket link to the monitoring server, merges every pushed
//! partial update into the local state tree, and prints the view on each
//! change. Logs go to stderr, the view to stdout.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use exmon_core::StateStore;
use exmon_link::{ConnectionManager, RetryPolicy};

mod cli;
mod view;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("EXMON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    // wss:// needs a process-wide rustls provider. Err means one is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    tracing::info!(endpoint = %args.endpoint, "exmon starting");

    let store = Arc::new(StateStore::new());
    let mut updates = store.subscribe();
    let handle = ConnectionManager::new()
        .with_retry_policy(RetryPolicy::fixed(Duration::from_secs(args.retry_delay_secs)))
        .start(args.endpoint, Arc::clone(&store));

    let initial = updates.borrow_and_update().clone();
    println!("{}", view::render(&initial, args.format)?);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = updates.borrow_and_update().clone();
                println!("{}", view::render(&snap, args.format)?);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("exmon: interrupt received, shutting down");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}
