//! Sync client implementation
//!
//! Each call opens one TCP connection, sends one request, waits for one
//! response and closes. There is no retry and no connection reuse.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};
use super::message::{read_frame, write_frame, Request, Response};
use crate::config::Config;
use crate::models::Task;

/// Client for the task-sync server
#[derive(Debug, Clone)]
pub struct SyncClient {
    /// Server host name or IP
    host: String,
    /// Server port
    port: u16,
    /// Deadline for one whole exchange
    timeout: Option<Duration>,
}

impl SyncClient {
    /// Create a new sync client with no deadline
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Create a client for the configured server and deadline
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sync_host.clone(), config.sync_port).with_timeout(config.sync_timeout())
    }

    /// Bound connect, send and receive by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server address as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Push the full task list, replacing the server's snapshot.
    ///
    /// Returns the server's confirmation message.
    pub async fn push_tasks(&self, tasks: &[Task]) -> SyncResult<String> {
        info!("Pushing {} task(s) to {}", tasks.len(), self.addr());
        match self.send(Request::push_tasks(tasks.to_vec())).await? {
            Response::Ok { message, .. } => Ok(message),
            Response::Error { message } => Err(SyncError::Server(message)),
        }
    }

    /// Download the CSV report of the last pushed snapshot
    pub async fn fetch_report_csv(&self) -> SyncResult<String> {
        info!("Requesting CSV report from {}", self.addr());
        match self.send(Request::GetReportCsv).await? {
            Response::Ok { csv: Some(csv), .. } => Ok(csv),
            Response::Ok { csv: None, .. } => Err(SyncError::protocol(
                "Sync server sent a report response without CSV data",
            )),
            Response::Error { message } => Err(SyncError::Server(message)),
        }
    }

    /// Run one request/response exchange, applying the deadline if set
    async fn send(&self, request: Request) -> SyncResult<Response> {
        let addr = self.addr();
        let result = match self.timeout {
            Some(after) => tokio::time::timeout(after, self.exchange(&addr, &request))
                .await
                .unwrap_or_else(|_| {
                    Err(SyncError::Timeout {
                        addr: addr.clone(),
                        after,
                    })
                }),
            None => self.exchange(&addr, &request).await,
        };

        match &result {
            Ok(response) if response.is_ok() => debug!("{} succeeded", request.tag()),
            Ok(response) => warn!("{} rejected: {}", request.tag(), response.message()),
            Err(e) => warn!("{} failed: {}", request.tag(), e),
        }

        result
    }

    async fn exchange(&self, addr: &str, request: &Request) -> SyncResult<Response> {
        debug!("Connecting to {}", addr);
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| SyncError::Connection {
                addr: addr.to_string(),
                source,
            })?;

        write_frame(&mut stream, &request.encode()?).await?;
        let body = read_frame(&mut stream).await?;
        Response::decode(&body)
    }
}
