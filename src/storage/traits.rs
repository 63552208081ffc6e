//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::graph::CitationGraph;
use crate::storage::{RunRecord, RunStatus, StoredRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A backend holds one snapshot of the citation graph per crawl run. Saving
/// the graph is idempotent: nodes are upserted so their derived attributes
/// follow the latest recomputation, and edges are inserted once.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `invocation` - Command line options of the run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, invocation: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with a final status and timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Graph Snapshot =====

    /// Writes every node and edge of the graph for a run
    fn save_graph(&mut self, run_id: i64, graph: &CitationGraph) -> StorageResult<()>;

    /// Gets one stored record
    fn get_record(&self, run_id: i64, id: &str) -> StorageResult<Option<StoredRecord>>;

    /// Gets the records a work was cited by, in insertion order
    fn get_citing_records(&self, run_id: i64, id: &str) -> StorageResult<Vec<StoredRecord>>;

    /// Counts records stored for a run
    fn count_records(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts citations stored for a run
    fn count_citations(&self, run_id: i64) -> StorageResult<u64>;
}
