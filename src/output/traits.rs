//! Exporter traits and error types
//!
//! This module defines the trait interface for graph exporters and the
//! atomic file writing they share.

use crate::graph::CitationGraph;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.to_string())
    }
}

impl From<csv::Error> for OutputError {
    fn from(e: csv::Error) -> Self {
        Self::Format(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A file format the citation graph can be serialized to
///
/// Exporters only render; the coordinator decides where and when the
/// rendering is written.
pub trait GraphExporter {
    /// File extension appended to the output prefix, without the dot
    fn extension(&self) -> &'static str;

    /// Renders the whole graph
    ///
    /// # Arguments
    ///
    /// * `graph` - Graph with derived attributes already computed
    fn render(&self, graph: &CitationGraph) -> OutputResult<String>;

    /// Every file of one write pass as (suffix, contents)
    ///
    /// Single-file formats keep the default of `extension()` and `render()`.
    fn render_files(&self, graph: &CitationGraph) -> OutputResult<Vec<(&'static str, String)>> {
        Ok(vec![(self.extension(), self.render(graph)?)])
    }
}

/// Writes `contents` to `path` through a temporary sibling and a rename
///
/// Readers of `path` see either the previous file or the new one, never a
/// partial write.
pub fn write_atomic(path: &Path, contents: &str) -> OutputResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let write = |target: &Path| -> std::io::Result<()> {
        let mut file = fs::File::create(target)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(target, path)
    };

    write(&tmp_path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        OutputError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Escapes text for XML attribute and element content
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}
