//! The embedded-DB execution history backend: a single local SQLite file,
//! WAL mode, a transaction per mutation, migrated via `rusqlite_migration`.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::error::StorageError;
use crate::history::{matches_filter, ExecutionRecord, ExecutionStatus, HistoryListFilter, HistoryStats, HistoryStore};

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE executions (
            id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            plan_file TEXT NOT NULL,
            plan_hash TEXT,
            plan_name TEXT,
            status TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            total_steps INTEGER NOT NULL,
            passed_steps INTEGER NOT NULL,
            failed_steps INTEGER NOT NULL,
            runner_version TEXT,
            runner_report TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_executions_timestamp ON executions(timestamp DESC);
        CREATE INDEX idx_executions_status ON executions(status);
        CREATE INDEX idx_executions_plan_hash ON executions(plan_hash);",
    )])
}

pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let mut conn = Connection::open(path)?;
        configure_and_migrate(&mut conn)?;
        Ok(SqliteHistoryStore { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory()?;
        configure_and_migrate(&mut conn)?;
        Ok(SqliteHistoryStore { conn: Mutex::new(conn) })
    }

    pub fn vacuum(&self) -> Result<(), StorageError> {
        self.conn.lock().unwrap().execute_batch("VACUUM;")?;
        Ok(())
    }
}

fn configure_and_migrate(conn: &mut Connection) -> Result<(), StorageError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    migrations().to_latest(conn).map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ExecutionRecord> {
    let status_str: String = row.get("status")?;
    let tags_json: String = row.get("tags")?;
    let metadata_json: String = row.get("metadata")?;
    let runner_report_json: Option<String> = row.get("runner_report")?;

    Ok(ExecutionRecord {
        id: row.get("id")?,
        timestamp: row.get("timestamp")?,
        plan_file: row.get("plan_file")?,
        plan_hash: row.get("plan_hash")?,
        plan_name: row.get("plan_name")?,
        status: parse_status(&status_str),
        duration_ms: row.get::<_, i64>("duration_ms")? as u64,
        total_steps: row.get::<_, i64>("total_steps")? as u32,
        passed_steps: row.get::<_, i64>("passed_steps")? as u32,
        failed_steps: row.get::<_, i64>("failed_steps")? as u32,
        runner_version: row.get("runner_version")?,
        runner_report: runner_report_json.and_then(|s| serde_json::from_str(&s).ok()),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

fn parse_status(s: &str) -> ExecutionStatus {
    match s {
        "success" => ExecutionStatus::Success,
        "failure" => ExecutionStatus::Failure,
        _ => ExecutionStatus::Error,
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn save(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO executions
                (id, timestamp, plan_file, plan_hash, plan_name, status, duration_ms,
                 total_steps, passed_steps, failed_steps, runner_version, runner_report,
                 tags, metadata, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)
             ON CONFLICT(id) DO UPDATE SET
                timestamp=excluded.timestamp, plan_file=excluded.plan_file,
                plan_hash=excluded.plan_hash, plan_name=excluded.plan_name,
                status=excluded.status, duration_ms=excluded.duration_ms,
                total_steps=excluded.total_steps, passed_steps=excluded.passed_steps,
                failed_steps=excluded.failed_steps, runner_version=excluded.runner_version,
                runner_report=excluded.runner_report, tags=excluded.tags,
                metadata=excluded.metadata",
            params![
                record.id,
                record.timestamp,
                record.plan_file,
                record.plan_hash,
                record.plan_name,
                record.status.as_str(),
                record.duration_ms as i64,
                record.total_steps as i64,
                record.passed_steps as i64,
                record.failed_steps as i64,
                record.runner_version,
                record.runner_report.as_ref().map(|v| v.to_string()),
                serde_json::to_string(&record.tags)?,
                serde_json::to_string(&record.metadata)?,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<ExecutionRecord, StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM executions WHERE id = ?1", params![id], row_to_record)
            .optional()?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn list(&self, filter: &HistoryListFilter) -> Result<Vec<ExecutionRecord>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM executions ORDER BY timestamp DESC")?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut out = Vec::new();
        for row in rows {
            let record = row?;
            if matches_filter(&record, filter) {
                out.push(record);
            }
        }
        Ok(out.into_iter().skip(filter.offset).take(filter.limit).collect())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM executions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn stats(&self) -> Result<HistoryStats, StorageError> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM executions", [], |r| r.get(0))?;
        let success_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM executions WHERE status = 'success'",
            [],
            |r| r.get(0),
        )?;
        let failure_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM executions WHERE status = 'failure'",
            [],
            |r| r.get(0),
        )?;
        let error_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM executions WHERE status = 'error'",
            [],
            |r| r.get(0),
        )?;
        let oldest: Option<String> = conn
            .query_row("SELECT MIN(timestamp) FROM executions", [], |r| r.get(0))
            .optional()?
            .flatten();
        let newest: Option<String> = conn
            .query_row("SELECT MAX(timestamp) FROM executions", [], |r| r.get(0))
            .optional()?
            .flatten();

        Ok(HistoryStats {
            backend: "embedded_db".to_string(),
            total: total as u64,
            success_count: success_count as u64,
            failure_count: failure_count as u64,
            error_count: error_count as u64,
            oldest,
            newest,
            size_bytes: None,
        })
    }

    fn clear(&self) -> Result<u64, StorageError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM executions", [])?;
        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, status: ExecutionStatus) -> ExecutionRecord {
        ExecutionRecord {
            id: id.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            plan_file: "plan.json".to_string(),
            plan_hash: Some("abc123".to_string()),
            plan_name: Some("demo".to_string()),
            status,
            duration_ms: 100,
            total_steps: 1,
            passed_steps: 1,
            failed_steps: 0,
            runner_version: None,
            runner_report: None,
            tags: vec!["smoke".to_string()],
            metadata: Default::default(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn save_is_idempotent_upsert() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&sample("a", ExecutionStatus::Success)).unwrap();
        let mut updated = sample("a", ExecutionStatus::Failure);
        updated.duration_ms = 999;
        store.save(&updated).unwrap();

        let fetched = store.get("a").unwrap();
        assert_eq!(fetched.status, ExecutionStatus::Failure);
        assert_eq!(fetched.duration_ms, 999);
        assert_eq!(store.stats().unwrap().total, 1);
    }

    #[test]
    fn list_filters_by_status_and_tags() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&sample("a", ExecutionStatus::Success)).unwrap();
        store.save(&sample("b", ExecutionStatus::Failure)).unwrap();

        let filter = HistoryListFilter {
            limit: 10,
            status: Some(ExecutionStatus::Failure),
            ..Default::default()
        };
        let results = store.list(&filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "b");
    }

    #[test]
    fn get_by_plan_hash_and_delete() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&sample("a", ExecutionStatus::Success)).unwrap();
        assert_eq!(store.get_by_plan_hash("abc123").unwrap().len(), 1);
        assert!(store.delete("a").unwrap());
        assert!(store.get("a").is_err());
    }
}
