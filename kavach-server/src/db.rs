//! SQLite persistence for the fault-CRUD collaborator — one table, indexed
//! by event time. Per §5, this is an external, unrelated relational store;
//! the decode core never touches it directly.

use rusqlite::{params, Connection, Result as SqlResult};
use serde::Serialize;
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS faults (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_time TEXT NOT NULL,
    fault_origin TEXT NOT NULL,
    module_id INTEGER NOT NULL,
    fault_type TEXT NOT NULL,
    fault_code TEXT NOT NULL,
    kavach_subsystem_id INTEGER,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_faults_event_time ON faults(event_time);
CREATE INDEX IF NOT EXISTS idx_faults_origin ON faults(fault_origin);
"#;

/// SQLite database for the fault-CRUD collaborator.
pub struct Database {
    conn: Connection,
}

#[derive(Debug, Serialize)]
pub struct FaultRow {
    pub id: i64,
    pub event_time: String,
    pub fault_origin: String,
    pub module_id: i64,
    pub fault_type: String,
    pub fault_code: String,
    pub kavach_subsystem_id: Option<i64>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &str) -> SqlResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            Connection::open(path)?
        };

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Database { conn })
    }

    pub fn open_memory() -> SqlResult<Self> {
        Self::open(":memory:")
    }

    pub fn insert_fault(
        &self,
        event_time: &str,
        fault_origin: &str,
        module_id: i64,
        fault_type: &str,
        fault_code: &str,
        kavach_subsystem_id: Option<i64>,
    ) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO faults (event_time, fault_origin, module_id, fault_type, fault_code, kavach_subsystem_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
            params![event_time, fault_origin, module_id, fault_type, fault_code, kavach_subsystem_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_faults(&self, from: &str, to: &str, limit: i64, offset: i64) -> SqlResult<Vec<FaultRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_time, fault_origin, module_id, fault_type, fault_code, kavach_subsystem_id
             FROM faults WHERE event_time >= ?1 AND event_time <= ?2
             ORDER BY event_time ASC LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt
            .query_map(params![from, to, limit, offset], |r| {
                Ok(FaultRow {
                    id: r.get(0)?,
                    event_time: r.get(1)?,
                    fault_origin: r.get(2)?,
                    module_id: r.get(3)?,
                    fault_type: r.get(4)?,
                    fault_code: r.get(5)?,
                    kavach_subsystem_id: r.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn count_faults(&self, from: &str, to: &str) -> SqlResult<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM faults WHERE event_time >= ?1 AND event_time <= ?2",
            params![from, to],
            |r| r.get(0),
        )
    }

    pub fn delete_fault(&self, id: i64) -> SqlResult<usize> {
        self.conn.execute("DELETE FROM faults WHERE id = ?1", params![id])
    }
}
