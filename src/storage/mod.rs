//! Storage module for persisting citation graph snapshots
//!
//! This module handles the optional SQLite mirror of the crawl:
//! - Schema management
//! - Run tracking with the configuration hash and final status
//! - Record and citation snapshots, rewritten as the graph grows

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub invocation: String,
    pub status: RunStatus,
}

/// A graph node as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub position: i64,
    pub title: String,
    pub url: Option<String>,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub cited_by: Option<i64>,
    pub cited_by_url: Option<String>,
    pub parent_id: Option<String>,
    pub group_index: Option<i64>,
    pub size: i64,
    pub community: i64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
