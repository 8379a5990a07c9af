//! Server-side sync state
//!
//! Holds the task list from the most recent push. It lives for the
//! lifetime of the server process and is never written to disk.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::report::build_csv_report;
use crate::models::Task;

/// Last received task snapshot, shared by all connection handlers
///
/// Cloning yields another handle to the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl SyncState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale, returning the new task count
    pub async fn replace(&self, tasks: Vec<Task>) -> usize {
        let mut current = self.tasks.lock().await;
        *current = tasks;
        current.len()
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// CSV report of the snapshot, `None` when nothing has been pushed
    pub async fn report_csv(&self) -> Option<String> {
        let tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            None
        } else {
            Some(build_csv_report(&tasks))
        }
    }
}
