//! SQLite-based suite storage.
//!
//! Provides persistent storage for:
//! - The timer state record (key-value store, one JSON document)
//! - Completed phase history and statistics
//! - The local task list (mirror of the remote bulk-sync collection)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::task::Task;
use crate::timer::Mode;

use super::data_dir;

/// A completed phase, as recorded to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: String,
    pub duration_min: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_work_min: u64,
    pub total_break_min: u64,
    pub completed_work_sessions: u64,
    pub today_sessions: u64,
    pub today_work_min: u64,
}

/// SQLite database for suite storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focusdeck/focusdeck.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("focusdeck.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                mode         TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id           TEXT PRIMARY KEY,
                text         TEXT NOT NULL,
                priority     TEXT NOT NULL DEFAULT 'medium',
                completed    INTEGER NOT NULL DEFAULT 0,
                tags         TEXT NOT NULL DEFAULT '[]',
                created_at   TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode);
            CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);",
        )?;
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Session history ──────────────────────────────────────────────

    /// Record a completed phase.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        mode: Mode,
        duration_min: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (mode, duration_min, completed_at) VALUES (?1, ?2, ?3)",
            params![mode.as_str(), duration_min, completed_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, duration_min, completed_at
             FROM sessions ORDER BY completed_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, mode, duration_min, completed_at) = row?;
            let completed_at = parse_rfc3339(&completed_at)?;
            records.push(SessionRecord {
                id,
                mode,
                duration_min,
                completed_at,
            });
        }
        Ok(records)
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        let mut stats = self.collect_stats("SELECT mode, COUNT(*), COALESCE(SUM(duration_min), 0) FROM sessions GROUP BY mode", None)?;

        let today = today_start();
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions WHERE mode = 'work' AND completed_at >= ?1",
        )?;
        let (today_sessions, today_work_min) = stmt.query_row(params![today], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?))
        })?;
        stats.today_sessions = today_sessions;
        stats.today_work_min = today_work_min;
        Ok(stats)
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        let today = today_start();
        let mut stats = self.collect_stats(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions WHERE completed_at >= ?1 GROUP BY mode",
            Some(&today),
        )?;
        stats.today_sessions = stats.completed_work_sessions;
        stats.today_work_min = stats.total_work_min;
        Ok(stats)
    }

    fn collect_stats(&self, sql: &str, arg: Option<&str>) -> Result<Stats, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        };
        let rows = match arg {
            Some(arg) => stmt.query_map(params![arg], map)?,
            None => stmt.query_map([], map)?,
        };

        let mut stats = Stats::default();
        for row in rows {
            let (mode, count, minutes) = row?;
            stats.total_sessions += count;
            match mode.as_str() {
                "work" => {
                    stats.completed_work_sessions += count;
                    stats.total_work_min += minutes;
                }
                "break" => {
                    stats.total_break_min += minutes;
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    // ── Task list ────────────────────────────────────────────────────

    /// Insert or update one task by id.
    pub fn upsert_task(&self, task: &Task) -> Result<(), StorageError> {
        let tags = serde_json::to_string(&task.tags)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO tasks (id, text, priority, completed, tags, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               text = excluded.text,
               priority = excluded.priority,
               completed = excluded.completed,
               tags = excluded.tags,
               created_at = excluded.created_at,
               completed_at = excluded.completed_at",
            params![
                task.id,
                task.text,
                task.priority.as_str(),
                task.completed,
                tags,
                task.created_at.to_rfc3339(),
                task.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// All tasks, oldest first (matching the remote collection's ordering).
    pub fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, priority, completed, tags, created_at, completed_at
             FROM tasks ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, text, priority, completed, tags, created_at, completed_at) = row?;
            tasks.push(Task {
                id,
                text,
                priority: crate::task::Priority::parse_or_default(&priority),
                completed,
                tags: serde_json::from_str(&tags).unwrap_or_default(),
                created_at: parse_rfc3339(&created_at)?,
                completed_at: match completed_at {
                    Some(ts) => Some(parse_rfc3339(&ts)?),
                    None => None,
                },
            });
        }
        Ok(tasks)
    }

    /// Mark a task completed. Returns false if the id is unknown.
    pub fn complete_task(&self, id: &str, completed_at: DateTime<Utc>) -> Result<bool, StorageError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed = 1, completed_at = ?2 WHERE id = ?1",
            params![id, completed_at.to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Delete a task. Returns false if the id is unknown.
    pub fn remove_task(&self, id: &str) -> Result<bool, StorageError> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Replace the whole local table with the given set, atomically.
    pub fn replace_all_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tasks", [])?;
        for task in tasks {
            self.upsert_task(task)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_tasks(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM tasks", [])?;
        Ok(())
    }
}

fn parse_rfc3339(ts: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{ts}': {e}")))
}

fn today_start() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("state").unwrap().is_none());
        db.kv_set("state", "hello").unwrap();
        assert_eq!(db.kv_get("state").unwrap().unwrap(), "hello");
        db.kv_set("state", "world").unwrap();
        assert_eq!(db.kv_get("state").unwrap().unwrap(), "world");
        db.kv_delete("state").unwrap();
        assert!(db.kv_get("state").unwrap().is_none());
    }

    #[test]
    fn session_stats_count_work_only() {
        let db = Database::open_memory().unwrap();
        db.record_session(Mode::Work, 25, Utc::now()).unwrap();
        db.record_session(Mode::Break, 5, Utc::now()).unwrap();
        db.record_session(Mode::Work, 50, Utc::now()).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.completed_work_sessions, 2);
        assert_eq!(stats.total_work_min, 75);
        assert_eq!(stats.total_break_min, 5);
        assert_eq!(stats.today_sessions, 2);
        assert_eq!(stats.today_work_min, 75);
    }

    #[test]
    fn recent_sessions_newest_first() {
        let db = Database::open_memory().unwrap();
        let earlier = Utc::now() - chrono::Duration::hours(1);
        db.record_session(Mode::Work, 25, earlier).unwrap();
        db.record_session(Mode::Break, 5, Utc::now()).unwrap();

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].mode, "break");
        assert_eq!(recent[1].mode, "work");
    }

    #[test]
    fn task_upsert_and_list() {
        let db = Database::open_memory().unwrap();
        let mut task = Task::new("write tests");
        db.upsert_task(&task).unwrap();

        task.text = "write more tests".into();
        db.upsert_task(&task).unwrap();

        let tasks = db.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "write more tests");
    }

    #[test]
    fn complete_and_remove_task() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("finish the report");
        db.upsert_task(&task).unwrap();

        assert!(db.complete_task(&task.id, Utc::now()).unwrap());
        let tasks = db.list_tasks().unwrap();
        assert!(tasks[0].completed);
        assert!(tasks[0].completed_at.is_some());

        assert!(db.remove_task(&task.id).unwrap());
        assert!(!db.remove_task(&task.id).unwrap());
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn replace_all_is_total() {
        let db = Database::open_memory().unwrap();
        db.upsert_task(&Task::new("old")).unwrap();

        let incoming = vec![Task::new("new one"), Task::new("new two")];
        db.replace_all_tasks(&incoming).unwrap();

        let tasks = db.list_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.text.starts_with("new")));

        db.clear_tasks().unwrap();
        assert!(db.list_tasks().unwrap().is_empty());
    }
}
