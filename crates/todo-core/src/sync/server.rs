//! Sync server implementation
//!
//! Accepts TCP connections and answers exactly one request per connection.
//! Every connection runs in its own task; the pushed snapshot is shared
//! through [`SyncState`].
//!
//! A connection that sends garbage, stalls past the deadline or hangs up
//! early is logged and dropped without affecting the accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};
use super::message::{read_frame, write_frame, Decoded, Request, Response};
use super::state::SyncState;

pub const UNKNOWN_REQUEST: &str = "Unknown request type.";
pub const INVALID_REQUEST: &str = "Invalid request received.";
pub const NO_TASKS_SYNCED: &str = "No tasks synced yet.";
pub const REPORT_GENERATED: &str = "Report generated.";

/// Pause after a failed accept so a persistent error does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Task-sync server bound to a listening socket
pub struct SyncServer {
    listener: TcpListener,
    state: SyncState,
    /// Deadline for one whole connection
    timeout: Option<Duration>,
}

impl SyncServer {
    /// Bind the listening socket
    ///
    /// This is the only fatal failure; once bound the server keeps serving.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> SyncResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            state: SyncState::new(),
            timeout: None,
        })
    }

    /// Bound each connection by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle to the shared snapshot
    pub fn state(&self) -> SyncState {
        self.state.clone()
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SyncResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve forever
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes
    ///
    /// Connections already accepted are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        match self.listener.local_addr() {
            Ok(addr) => info!("Task sync server listening on {}", addr),
            Err(_) => info!("Task sync server listening"),
        }

        tokio::pin!(shutdown);
        let mut next_id: u64 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Task sync server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        let id = next_id;
                        let state = self.state.clone();
                        let timeout = self.timeout;
                        debug!(conn = id, %peer, "Accepted connection");

                        tokio::spawn(async move {
                            match serve_connection(stream, peer, &state, timeout).await {
                                Ok(()) => debug!(conn = id, "Connection closed"),
                                Err(e) => warn!(conn = id, %peer, "Connection dropped: {}", e),
                            }
                        });
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }
    }
}

/// Read one request, answer it and close
///
/// Frame or CBOR errors end the connection without a response.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: &SyncState,
    timeout: Option<Duration>,
) -> SyncResult<()> {
    let exchange = async {
        let body = read_frame(&mut stream).await?;
        let decoded = Request::decode(&body)?;
        let response = handle_request(state, decoded).await;
        write_frame(&mut stream, &response.encode()?).await?;
        stream.shutdown().await?;
        Ok::<(), SyncError>(())
    };

    match timeout {
        Some(after) => tokio::time::timeout(after, exchange)
            .await
            .unwrap_or_else(|_| {
                Err(SyncError::Timeout {
                    addr: peer.to_string(),
                    after,
                })
            }),
        None => exchange.await,
    }
}

/// Compute the response to one decoded request
pub async fn handle_request(state: &SyncState, decoded: Decoded) -> Response {
    match decoded {
        Decoded::Unknown(tag) => {
            warn!("Unknown request type '{}'", tag);
            Response::error(UNKNOWN_REQUEST)
        }
        Decoded::Invalid(reason) => {
            warn!("Invalid request: {}", reason);
            Response::error(INVALID_REQUEST)
        }
        Decoded::Request(Request::PushTasks { tasks }) => {
            info!("Received {} task(s).", tasks.len());
            for task in &tasks {
                info!(
                    "- [{}] {} (due: {})",
                    task.status,
                    task.title,
                    task.due_date.as_deref().unwrap_or("null")
                );
            }

            let count = state.replace(tasks).await;
            Response::ok(format!("Sync completed. Received {} tasks.", count))
        }
        Decoded::Request(Request::GetReportCsv) => match state.report_csv().await {
            Some(csv) => Response::ok_with_csv(REPORT_GENERATED, csv),
            None => Response::error(NO_TASKS_SYNCED),
        },
    }
}
