//! SQLite-backed repository for users and tasks
//!
//! Every operation is scoped to a user ID: a task belonging to another user
//! is treated as missing.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::config::Config;
use crate::models::{now_timestamp, NewTask, ProfileUpdate, Task, TaskStats, TaskStatus, User};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{
    fold_legacy_completed, has_legacy_completed, init_schema, needs_init,
};

const SELECT_USER: &str = "SELECT id, name, display_name, focus_area, daily_goal FROM users";

const SELECT_TASK: &str = "SELECT id, title, notes, due_date, status, created_at FROM tasks";

/// Open tasks first, then by due date (undated last), then oldest first
const TASK_ORDER: &str = "ORDER BY CASE status WHEN 'DONE' THEN 1 ELSE 0 END, \
                          due_date IS NULL, due_date, created_at, id";

/// Operations the front ends need from the task store
pub trait Repository {
    /// Find a user by name, creating it if it does not exist
    fn ensure_user(&self, name: &str) -> StorageResult<User>;

    fn find_user_by_name(&self, name: &str) -> StorageResult<Option<User>>;

    /// Overwrite the optional profile fields and return the reloaded user
    fn update_profile(&self, user_id: i64, profile: &ProfileUpdate) -> StorageResult<User>;

    fn fetch_tasks(&self, user_id: i64) -> StorageResult<Vec<Task>>;

    fn fetch_tasks_by_status(&self, user_id: i64, status: TaskStatus) -> StorageResult<Vec<Task>>;

    /// Insert a task with status TODO and return it as stored
    fn add_task(&self, user_id: i64, task: &NewTask) -> StorageResult<Task>;

    /// Returns false when the user has no such task
    fn update_task_status(&self, user_id: i64, task_id: i64, status: TaskStatus)
        -> StorageResult<bool>;

    /// Returns false when the user has no such task
    fn delete_task(&self, user_id: i64, task_id: i64) -> StorageResult<bool>;

    fn fetch_stats(&self, user_id: i64) -> StorageResult<TaskStats>;

    fn mark_complete(&self, user_id: i64, task_id: i64) -> StorageResult<bool> {
        self.update_task_status(user_id, task_id, TaskStatus::Done)
    }

    fn mark_incomplete(&self, user_id: i64, task_id: i64) -> StorageResult<bool> {
        self.update_task_status(user_id, task_id, TaskStatus::Todo)
    }
}

/// Repository over a single SQLite connection
pub struct SqliteRepository {
    conn: Connection,
    /// `tasks` also has the older `completed` flag, kept in step with status
    legacy_completed: bool,
}

impl SqliteRepository {
    /// Open or create the database in the configured data directory
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.database_path())
    }

    /// Open or create the database at `path`
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if needs_init(&conn) {
            debug!("Initializing database schema");
            init_schema(&conn)?;
        }

        let legacy_completed = has_legacy_completed(&conn)?;
        if legacy_completed {
            // Older clients may have written the flag since the last open
            fold_legacy_completed(&conn)?;
        }

        Ok(Self {
            conn,
            legacy_completed,
        })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn find_user_by_id(&self, user_id: i64) -> StorageResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_USER),
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn query_tasks(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StorageResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let tasks = stmt
            .query_map(params, task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }
}

impl Repository for SqliteRepository {
    fn ensure_user(&self, name: &str) -> StorageResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::validation("Name cannot be empty."));
        }

        if let Some(user) = self.find_user_by_name(name)? {
            return Ok(user);
        }

        self.conn
            .execute("INSERT INTO users (name) VALUES (?)", params![name])?;
        debug!("Created user '{}'", name);

        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            display_name: None,
            focus_area: None,
            daily_goal: None,
        })
    }

    fn find_user_by_name(&self, name: &str) -> StorageResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{} WHERE name = ?", SELECT_USER),
                params![name],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn update_profile(&self, user_id: i64, profile: &ProfileUpdate) -> StorageResult<User> {
        if profile.daily_goal == Some(0) {
            return Err(StorageError::validation("Daily goal must be positive."));
        }

        let updated = self.conn.execute(
            "UPDATE users SET display_name = ?, focus_area = ?, daily_goal = ? WHERE id = ?",
            params![
                non_blank(profile.display_name.as_deref()),
                non_blank(profile.focus_area.as_deref()),
                profile.daily_goal,
                user_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::UserNotFound(user_id));
        }

        self.find_user_by_id(user_id)?
            .ok_or(StorageError::UserNotFound(user_id))
    }

    fn fetch_tasks(&self, user_id: i64) -> StorageResult<Vec<Task>> {
        self.query_tasks(
            &format!("{} WHERE user_id = ? {}", SELECT_TASK, TASK_ORDER),
            &[&user_id],
        )
    }

    fn fetch_tasks_by_status(&self, user_id: i64, status: TaskStatus) -> StorageResult<Vec<Task>> {
        self.query_tasks(
            &format!(
                "{} WHERE user_id = ? AND status = ? {}",
                SELECT_TASK, TASK_ORDER
            ),
            &[&user_id, &status.as_str()],
        )
    }

    fn add_task(&self, user_id: i64, task: &NewTask) -> StorageResult<Task> {
        let title = task.title.trim();
        if title.is_empty() {
            return Err(StorageError::validation("Task title cannot be empty."));
        }

        let notes = non_blank(task.notes.as_deref());
        let due_date = non_blank(task.due_date.as_deref());
        let created_at = now_timestamp();

        self.conn.execute(
            "INSERT INTO tasks (user_id, title, notes, due_date, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                user_id,
                title,
                notes,
                due_date,
                TaskStatus::Todo.as_str(),
                created_at
            ],
        )?;

        Ok(Task {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            notes: notes.map(str::to_string),
            due_date: due_date.map(str::to_string),
            status: TaskStatus::Todo,
            created_at,
        })
    }

    fn update_task_status(
        &self,
        user_id: i64,
        task_id: i64,
        status: TaskStatus,
    ) -> StorageResult<bool> {
        let sql = if self.legacy_completed {
            "UPDATE tasks SET status = ?1, completed = (?1 = 'DONE') WHERE id = ?2 AND user_id = ?3"
        } else {
            "UPDATE tasks SET status = ?1 WHERE id = ?2 AND user_id = ?3"
        };
        let updated = self
            .conn
            .execute(sql, params![status.as_str(), task_id, user_id])?;
        Ok(updated > 0)
    }

    fn delete_task(&self, user_id: i64, task_id: i64) -> StorageResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM tasks WHERE id = ? AND user_id = ?",
            params![task_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn fetch_stats(&self, user_id: i64) -> StorageResult<TaskStats> {
        let (total, completed): (u32, u32) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'DONE' THEN 1 ELSE 0 END), 0) \
             FROM tasks WHERE user_id = ?",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(TaskStats::new(total, completed))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let daily_goal: Option<i64> = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        focus_area: row.get(3)?,
        // Rows written by older versions may hold zero or negative goals
        daily_goal: daily_goal.and_then(|g| u32::try_from(g).ok()).filter(|g| *g > 0),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: Option<String> = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        notes: row.get(2)?,
        due_date: row.get(3)?,
        status: status
            .as_deref()
            .map(TaskStatus::from_stored)
            .unwrap_or_default(),
        created_at: row.get(5)?,
    })
}

/// Trimmed value, or `None` when blank
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
