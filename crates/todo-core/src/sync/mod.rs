//! Task sync over TCP
//!
//! A client pushes its full task list to a remote listener and can later
//! download a CSV summary of the last pushed list.
//!
//! ## Protocol
//!
//! One request and one response per connection:
//! 1. Client connects and sends a `PUSH_TASKS` or `GET_REPORT_CSV` frame
//! 2. Server decodes, dispatches and answers with an `OK` or `ERROR` frame
//! 3. Both sides close
//!
//! See [`message`] for the framing.
//!
//! ## Usage
//!
//! ```ignore
//! let client = SyncClient::new("127.0.0.1", 5555);
//! let message = client.push_tasks(&tasks).await?;
//! let csv = client.fetch_report_csv().await?;
//! ```

mod client;
mod error;
pub mod message;
pub mod report;
mod server;
mod state;

pub use client::SyncClient;
pub use error::{SyncError, SyncResult};
pub use message::{Decoded, Request, Response};
pub use report::{build_csv_report, ReportSummary};
pub use server::{handle_request, SyncServer};
pub use state::SyncState;
