//! SQLite snapshot output
//!
//! This module mirrors the citation graph into the storage backend, one run
//! per crawl, so results can be queried after the crawl finishes.

use crate::graph::CitationGraph;
use crate::output::traits::OutputResult;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use std::path::Path;

/// Writes the graph into `<prefix>.sqlite`
pub struct SqliteOutputHandler {
    storage: Box<dyn Storage + Send>,
    run_id: i64,
}

impl SqliteOutputHandler {
    /// Opens the database and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Database file, created if missing
    /// * `config_hash` - Hash of the configuration file, empty when defaults are used
    /// * `invocation` - Command line options of the run
    pub fn open(path: &Path, config_hash: &str, invocation: &str) -> OutputResult<Self> {
        let storage = SqliteStorage::new(path)?;
        Self::with_storage(Box::new(storage), config_hash, invocation)
    }

    /// Starts a new run on an existing storage backend
    pub fn with_storage(
        mut storage: Box<dyn Storage + Send>,
        config_hash: &str,
        invocation: &str,
    ) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash, invocation)?;
        tracing::debug!("Started SQLite run {}", run_id);
        Ok(Self { storage, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Writes the current graph snapshot
    pub fn save(&mut self, graph: &CitationGraph) -> OutputResult<()> {
        self.storage.save_graph(self.run_id, graph)?;
        Ok(())
    }

    /// Records the final run status
    pub fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        self.storage.finish_run(self.run_id, status)?;
        tracing::debug!("SQLite run {} {}", self.run_id, status.to_db_string());
        Ok(())
    }
}
