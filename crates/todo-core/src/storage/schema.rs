//! SQLite schema for users and tasks
//!
//! Schema changes are additive only: columns introduced after the first
//! release are added to existing databases with defaults, never dropped.

use std::collections::HashSet;

use rusqlite::{Connection, Result};
use tracing::info;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 2;

/// Completion flag kept by task tables that predate `status`
const LEGACY_COMPLETED: &str = "completed";

/// Columns added to `users` after the table was first released
const USER_COLUMNS: &[(&str, &str)] = &[
    ("display_name", "TEXT"),
    ("focus_area", "TEXT"),
    ("daily_goal", "INTEGER"),
];

/// Initialize the database schema
///
/// Safe to run against an existing database: tables are created if
/// missing and any missing columns are added.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT,
            focus_area TEXT,
            daily_goal INTEGER
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            notes TEXT,
            due_date TEXT,
            status TEXT NOT NULL DEFAULT 'TODO',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
        "#,
    )?;

    ensure_user_columns(conn)?;
    ensure_task_columns(conn)?;

    conn.execute_batch(
        r#"
        -- Per-user listing and status filters
        CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn ensure_user_columns(conn: &Connection) -> Result<()> {
    let columns = table_columns(conn, "users")?;
    for (column, sql_type) in USER_COLUMNS {
        add_column_if_missing(conn, "users", &columns, column, sql_type)?;
    }
    Ok(())
}

/// Add `status` to task tables from before it existed.
///
/// Older tables track completion in a `completed` flag, sometimes next to
/// `status`. Completed rows are folded into status whenever the flag exists.
fn ensure_task_columns(conn: &Connection) -> Result<()> {
    let columns = table_columns(conn, "tasks")?;
    add_column_if_missing(
        conn,
        "tasks",
        &columns,
        "status",
        "TEXT NOT NULL DEFAULT 'TODO'",
    )?;

    if columns.contains(LEGACY_COMPLETED) {
        fold_legacy_completed(conn)?;
    }

    Ok(())
}

/// Whether `tasks` still carries the legacy `completed` flag
pub fn has_legacy_completed(conn: &Connection) -> Result<bool> {
    Ok(table_columns(conn, "tasks")?.contains(LEGACY_COMPLETED))
}

/// Mark rows flagged `completed = 1` as DONE, returning how many changed
pub fn fold_legacy_completed(conn: &Connection) -> Result<usize> {
    let migrated = conn.execute(
        "UPDATE tasks SET status = 'DONE' WHERE completed = 1 AND status <> 'DONE'",
        [],
    )?;
    if migrated > 0 {
        info!("Migrated {} completed task(s) to DONE status", migrated);
    }
    Ok(migrated)
}

/// Column names of `table`
fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<HashSet<_>>>()?;
    Ok(names)
}

/// Returns whether the column was added
fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    columns: &HashSet<String>,
    column: &str,
    sql_type: &str,
) -> Result<bool> {
    if columns.contains(column) {
        return Ok(false);
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column, sql_type
    ))?;
    info!("Added column {}.{}", table, column);
    Ok(true)
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    // Check if schema_info table exists
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"tasks".to_string()));
        assert!(tables.contains(&"schema_info".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();

        // Before init, needs init
        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let columns = table_columns(&conn, "tasks").unwrap();
        assert!(columns.contains("status"));
        assert!(!columns.contains("completed"));
    }

    #[test]
    fn test_migrates_legacy_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );
            CREATE TABLE tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                notes TEXT,
                due_date TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO users (name) VALUES ('sam');
            INSERT INTO tasks (user_id, title, completed) VALUES (1, 'old done', 1);
            INSERT INTO tasks (user_id, title, completed) VALUES (1, 'old open', 0);
            "#,
        )
        .unwrap();

        assert!(needs_init(&conn));
        init_schema(&conn).unwrap();

        let user_columns = table_columns(&conn, "users").unwrap();
        assert!(user_columns.contains("display_name"));
        assert!(user_columns.contains("focus_area"));
        assert!(user_columns.contains("daily_goal"));

        let statuses: Vec<(String, String)> = conn
            .prepare("SELECT title, status FROM tasks ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(
            statuses,
            vec![
                ("old done".to_string(), "DONE".to_string()),
                ("old open".to_string(), "TODO".to_string()),
            ]
        );
    }

    #[test]
    fn test_folds_completed_when_status_already_exists() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                display_name TEXT,
                focus_area TEXT,
                daily_goal INTEGER
            );
            CREATE TABLE tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                notes TEXT,
                due_date TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'TODO',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            INSERT INTO users (name) VALUES ('sam');
            INSERT INTO tasks (user_id, title, completed) VALUES (1, 'finished', 1);
            INSERT INTO tasks (user_id, title, completed, status) VALUES (1, 'started', 0, 'DOING');
            "#,
        )
        .unwrap();

        assert!(has_legacy_completed(&conn).unwrap());
        init_schema(&conn).unwrap();

        let statuses: Vec<String> = conn
            .prepare("SELECT status FROM tasks ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert_eq!(statuses, vec!["DONE".to_string(), "DOING".to_string()]);

        // Nothing left to fold on a second pass
        assert_eq!(fold_legacy_completed(&conn).unwrap(), 0);
    }

    #[test]
    fn test_indexes_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_tasks_user_id".to_string()));
        assert!(indexes.contains(&"idx_tasks_user_status".to_string()));
    }
}
