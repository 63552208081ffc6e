//! Database schema definitions
//!
//! This module contains the SQL schema for the citation snapshot database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    invocation TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Graph nodes, one row per record id per run
CREATE TABLE IF NOT EXISTS records (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    url TEXT,
    authors TEXT,
    year TEXT,
    cited_by INTEGER,
    cited_by_url TEXT,
    parent_id TEXT,
    group_index INTEGER,
    size INTEGER NOT NULL,
    community INTEGER NOT NULL,
    PRIMARY KEY (run_id, id)
);

CREATE INDEX IF NOT EXISTS idx_records_parent ON records(run_id, parent_id);

-- Graph edges: from_id cites to_id
CREATE TABLE IF NOT EXISTS citations (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    from_id TEXT NOT NULL,
    to_id TEXT NOT NULL,
    PRIMARY KEY (run_id, from_id, to_id)
);

CREATE INDEX IF NOT EXISTS idx_citations_to ON citations(run_id, to_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
