//! Data models for todo
//!
//! Defines the core data structures: Task, TaskStatus, User and TaskStats.
//! Tasks travel over the sync protocol as-is, so their serde shape is
//! the wire shape (camelCase field names, upper-case status names).

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Timestamp format used for `created_at`, matching SQLite's CURRENT_TIMESTAMP
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lifecycle state of a task
///
/// Status is the only stored representation of completion; see
/// [`Task::is_completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    /// All statuses in board column order
    pub fn all() -> [TaskStatus; 3] {
        [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done]
    }

    /// Upper-case name used in storage, on the wire and in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Doing => "DOING",
            TaskStatus::Done => "DONE",
        }
    }

    /// Lenient parse for stored or received values.
    ///
    /// Blank or unrecognized values fall back to `Todo`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim() {
            "TODO" => TaskStatus::Todo,
            "DOING" => TaskStatus::Doing,
            "DONE" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict, case-insensitive parse for user input
impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "DOING" => Ok(TaskStatus::Doing),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!(
                "Unknown status '{}'. Expected one of: todo, doing, done",
                other.to_ascii_lowercase()
            )),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        Self::from_stored(&s)
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A task owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier assigned by the store
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Free-form due date, never parsed
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Creation time, set once by the store
    pub created_at: String,
}

impl Task {
    /// Create a task with the given ID and title, status TODO, created now
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            notes: None,
            due_date: None,
            status: TaskStatus::Todo,
            created_at: now_timestamp(),
        }
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the task is done (derived from status)
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Single-character completion marker for list views
    pub fn completion_label(&self) -> &'static str {
        if self.is_completed() {
            "✓"
        } else {
            " "
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn due_date(mut self, due_date: Option<String>) -> Self {
        self.due_date = due_date;
        self
    }
}

/// A user of the local store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    /// Unique, case-sensitive login name
    pub name: String,
    pub display_name: Option<String>,
    pub focus_area: Option<String>,
    /// Tasks per day the user aims for; `None` means no goal
    pub daily_goal: Option<u32>,
}

impl User {
    /// Name to greet the user with
    pub fn greeting_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }
}

/// Profile fields to overwrite with [`crate::Repository::update_profile`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub focus_area: Option<String>,
    pub daily_goal: Option<u32>,
}

/// Task counts for a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: u32,
    pub completed: u32,
}

impl TaskStats {
    pub fn new(total: u32, completed: u32) -> Self {
        Self { total, completed }
    }

    /// Tasks not yet done, never negative
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.completed)
    }

    /// Completed tasks still needed to reach `daily_goal`
    pub fn goal_shortfall(&self, daily_goal: u32) -> u32 {
        daily_goal.saturating_sub(self.completed)
    }
}

/// Current UTC time in [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
