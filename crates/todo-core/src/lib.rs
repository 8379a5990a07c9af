//! todo core library
//!
//! This crate provides the core functionality for todo, a personal task
//! list manager with a small TCP sync protocol.
//!
//! # Architecture
//!
//! - **SQLite**: local store of users and their tasks
//! - **Sync**: push the task list to a remote listener, fetch a CSV report
//!
//! # Quick Start
//!
//! ```text
//! let repo = SqliteRepository::open(&Config::load()?)?;
//! let user = repo.ensure_user("sam")?;
//!
//! repo.add_task(user.id, &NewTask::new("Water plants"))?;
//! let tasks = repo.fetch_tasks(user.id)?;
//!
//! let client = SyncClient::new("127.0.0.1", 5555);
//! client.push_tasks(&tasks).await?;
//! ```
//!
//! # Modules
//!
//! - `models`: Data structures for tasks, users and stats
//! - `storage`: SQLite schema and repository
//! - `sync`: Wire protocol, client, server and CSV report
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use models::{NewTask, ProfileUpdate, Task, TaskStats, TaskStatus, User};
pub use storage::{Repository, SqliteRepository, StorageError};
pub use sync::{SyncClient, SyncError, SyncServer};
