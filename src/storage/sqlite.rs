//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::graph::CitationGraph;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "id, position, title, url, authors, year, cited_by, cited_by_url,
     parent_id, group_index, size, community";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn map_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            invocation: row.get(4)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                .unwrap_or(RunStatus::Running),
        })
    }

    fn map_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
        Ok(StoredRecord {
            id: row.get(0)?,
            position: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            authors: row.get(4)?,
            year: row.get(5)?,
            cited_by: row.get(6)?,
            cited_by_url: row.get(7)?,
            parent_id: row.get(8)?,
            group_index: row.get(9)?,
            size: row.get(10)?,
            community: row.get(11)?,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, invocation: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, invocation, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, invocation, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, invocation, status
                 FROM runs WHERE id = ?1",
                params![run_id],
                Self::map_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, invocation, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::map_run,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Graph Snapshot =====

    fn save_graph(&mut self, run_id: i64, graph: &CitationGraph) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO records (run_id, id, position, title, url, authors, year, cited_by,
                     cited_by_url, parent_id, group_index, size, community)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(run_id, id) DO UPDATE SET
                     size = excluded.size, community = excluded.community",
            )?;
            for (position, node) in graph.nodes().iter().enumerate() {
                upsert.execute(params![
                    run_id,
                    node.id,
                    position as i64,
                    node.title,
                    node.url,
                    node.authors,
                    node.year,
                    node.cited_by.map(|c| c as i64),
                    node.cited_by_url,
                    node.parent_id,
                    node.group_index.map(|g| g as i64),
                    node.size,
                    node.community as i64,
                ])?;
            }

            let mut cite = tx.prepare(
                "INSERT OR IGNORE INTO citations (run_id, from_id, to_id) VALUES (?1, ?2, ?3)",
            )?;
            for (from, to) in graph.edge_ids() {
                cite.execute(params![run_id, from, to])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_record(&self, run_id: i64, id: &str) -> StorageResult<Option<StoredRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM records WHERE run_id = ?1 AND id = ?2",
                    RECORD_COLUMNS
                ),
                params![run_id, id],
                Self::map_record,
            )
            .optional()?;
        Ok(record)
    }

    fn get_citing_records(&self, run_id: i64, id: &str) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records
             WHERE run_id = ?1 AND id IN (SELECT from_id FROM citations WHERE run_id = ?1 AND to_id = ?2)
             ORDER BY position",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![run_id, id], Self::map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_citations(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM citations WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CitationRecord, PageContext};

    fn sample_graph() -> CitationGraph {
        let mut graph = CitationGraph::new();
        let context = PageContext {
            id: "root".to_string(),
            title: "Root Work".to_string(),
            cited_by_count: Some(40),
        };

        let mut a = CitationRecord::new("a", "Paper A");
        a.cited_by_count = Some(10);
        a.parent_id = Some("root".to_string());
        a.group_index = Some(1);
        graph.insert(&a, Some(&context));
        graph.insert(&CitationRecord::new("b", "Paper B"), Some(&context));
        graph
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_and_finish_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", "depth=1 pages=1").unwrap();
        assert!(run_id > 0);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.config_hash, "test_hash");
        assert!(run.finished_at.is_none());

        storage.finish_run(run_id, RunStatus::Interrupted).unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Interrupted);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_missing_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(storage.get_run(42), Err(StorageError::RunNotFound(42))));
        assert!(storage.finish_run(42, RunStatus::Completed).is_err());
    }

    #[test]
    fn test_save_graph() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", "").unwrap();

        storage.save_graph(run_id, &sample_graph()).unwrap();

        assert_eq!(storage.count_records(run_id).unwrap(), 3);
        assert_eq!(storage.count_citations(run_id).unwrap(), 2);

        let a = storage.get_record(run_id, "a").unwrap().unwrap();
        assert_eq!(a.title, "Paper A");
        assert_eq!(a.cited_by, Some(10));
        assert_eq!(a.parent_id.as_deref(), Some("root"));
        assert_eq!(a.position, 0);
    }

    #[test]
    fn test_save_graph_updates_derived_attributes() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", "").unwrap();
        let mut graph = sample_graph();

        storage.save_graph(run_id, &graph).unwrap();
        assert_eq!(storage.get_record(run_id, "root").unwrap().unwrap().size, 1);

        graph.recompute_derived(Some(10));
        storage.save_graph(run_id, &graph).unwrap();

        assert_eq!(storage.get_record(run_id, "root").unwrap().unwrap().size, 2);
        assert_eq!(storage.count_records(run_id).unwrap(), 3);
        assert_eq!(storage.count_citations(run_id).unwrap(), 2);
    }

    #[test]
    fn test_citing_records_in_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", "").unwrap();
        storage.save_graph(run_id, &sample_graph()).unwrap();

        let citing: Vec<String> = storage
            .get_citing_records(run_id, "root")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(citing, vec!["a", "b"]);
    }

    #[test]
    fn test_runs_are_isolated() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_run("h", "").unwrap();
        let second = storage.create_run("h", "").unwrap();

        storage.save_graph(first, &sample_graph()).unwrap();
        assert_eq!(storage.count_records(second).unwrap(), 0);
    }
}
