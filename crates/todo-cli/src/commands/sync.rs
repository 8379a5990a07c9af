//! Sync command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use todo_core::{Config, Repository, SyncClient, SyncServer, User};

use crate::output::Output;

/// Where the client should connect, with command-line overrides applied
pub fn client_for(config: &Config, host: Option<String>, port: Option<u16>) -> SyncClient {
    SyncClient::new(
        host.unwrap_or_else(|| config.sync_host.clone()),
        port.unwrap_or(config.sync_port),
    )
    .with_timeout(config.sync_timeout())
}

/// Push the user's full task list to the sync server
pub async fn push(
    repo: &impl Repository,
    user: &User,
    client: &SyncClient,
    output: &Output,
) -> Result<()> {
    let tasks = repo.fetch_tasks(user.id)?;

    output.message(&format!(
        "Pushing {} task(s) to {}...",
        tasks.len(),
        client.addr()
    ));

    let message = client
        .push_tasks(&tasks)
        .await
        .with_context(|| format!("Sync with {} failed", client.addr()))?;

    output.success(&message);
    Ok(())
}

/// Download the CSV report of the last push
pub async fn report(client: &SyncClient, target: Option<PathBuf>, output: &Output) -> Result<()> {
    let csv = client
        .fetch_report_csv()
        .await
        .with_context(|| format!("Report from {} failed", client.addr()))?;

    match target {
        Some(path) => {
            std::fs::write(&path, &csv)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            output.success(&format!("Report written to {}", path.display()));
        }
        None if output.is_json() => println!("{}", serde_json::json!({ "csv": csv })),
        None => print!("{}", csv),
    }

    Ok(())
}

/// Run the sync server until Ctrl-C
pub async fn serve(config: &Config, bind: String, port: Option<u16>, output: &Output) -> Result<()> {
    let addr = format!("{}:{}", bind, port.unwrap_or(config.sync_port));
    let server = SyncServer::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind sync server to {}", addr))?
        .with_timeout(config.sync_timeout());

    let local = server.local_addr()?;
    output.message(&format!(
        "Task sync server listening on {}. Press Ctrl-C to stop.",
        local
    ));

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Sync server stopped");
    Ok(())
}
