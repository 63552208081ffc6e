//! Output module for exporting the citation graph
//!
//! This module handles:
//! - Serializing the graph to GEXF, GraphML, D3 JSON, CSV tables and an HTML view
//! - Mirroring the graph into an optional SQLite snapshot
//! - Rewriting every enabled export after each insertion
//! - Recording crawl statistics

mod csv_output;
mod gexf;
mod graphml;
mod html;
mod json;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_output::CsvExporter;
pub use gexf::GexfExporter;
pub use graphml::GraphmlExporter;
pub use html::HtmlExporter;
pub use json::{to_node_link_json, JsonExporter};
pub use sqlite_output::SqliteOutputHandler;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{write_atomic, GraphExporter, OutputError, OutputResult};

use crate::config::OutputConfig;
use crate::graph::{CitationGraph, GraphNode};
use crate::state::CrawlSession;
use crate::storage::RunStatus;
use std::path::PathBuf;

/// Value type of an exported node attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeKind {
    Text,
    Integer,
}

/// Node attributes written by the XML exporters, in column order
pub(crate) const NODE_ATTRIBUTES: &[(&str, AttributeKind)] = &[
    ("url", AttributeKind::Text),
    ("title", AttributeKind::Text),
    ("authors", AttributeKind::Text),
    ("year", AttributeKind::Text),
    ("cited_by", AttributeKind::Integer),
    ("cited_by_url", AttributeKind::Text),
    ("parent_id", AttributeKind::Text),
    ("group_index", AttributeKind::Integer),
    ("size", AttributeKind::Integer),
    ("community", AttributeKind::Integer),
];

/// Values of `NODE_ATTRIBUTES` for one node; `None` when absent
pub(crate) fn node_attributes(node: &GraphNode) -> Vec<Option<String>> {
    vec![
        node.url.clone(),
        Some(node.title.clone()),
        node.authors.clone(),
        node.year.clone(),
        node.cited_by.map(|c| c.to_string()),
        node.cited_by_url.clone(),
        node.parent_id.clone(),
        node.group_index.map(|g| g.to_string()),
        Some(node.size.to_string()),
        Some(node.community.to_string()),
    ]
}

/// Keeps every enabled export in sync with the growing graph
///
/// Called after each insertion so that an interrupted crawl still leaves
/// complete, readable files behind.
pub struct OutputCoordinator {
    prefix: String,
    exporters: Vec<Box<dyn GraphExporter + Send>>,
    sqlite: Option<SqliteOutputHandler>,
    written: Vec<PathBuf>,
    writes: u64,
}

impl OutputCoordinator {
    /// Creates the coordinator for the formats enabled in `config`
    ///
    /// # Arguments
    ///
    /// * `config` - Output section of the configuration
    /// * `invocation` - Crawl options shown in the HTML view and stored with the SQLite run
    /// * `config_hash` - Hash of the configuration file, if one was loaded
    ///
    /// # Returns
    ///
    /// * `Ok(OutputCoordinator)` - Ready to write
    /// * `Err(OutputError)` - The output directory or database could not be created
    pub fn new(
        config: &OutputConfig,
        invocation: &str,
        config_hash: Option<&str>,
    ) -> OutputResult<Self> {
        let prefix_path = PathBuf::from(&config.prefix);
        if let Some(parent) = prefix_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut exporters: Vec<Box<dyn GraphExporter + Send>> = Vec::new();
        if config.gexf {
            exporters.push(Box::new(GexfExporter));
        }
        if config.graphml {
            exporters.push(Box::new(GraphmlExporter));
        }
        if config.json {
            exporters.push(Box::new(JsonExporter));
        }
        if config.csv {
            exporters.push(Box::new(CsvExporter));
        }
        if config.html {
            exporters.push(Box::new(HtmlExporter::new(invocation)));
        }

        let sqlite = if config.sqlite {
            let path = PathBuf::from(format!("{}.sqlite", config.prefix));
            Some(SqliteOutputHandler::open(
                &path,
                config_hash.unwrap_or_default(),
                invocation,
            )?)
        } else {
            None
        };

        Ok(Self {
            prefix: config.prefix.clone(),
            exporters,
            sqlite,
            written: Vec::new(),
            writes: 0,
        })
    }

    /// Path of the export with the given extension
    pub fn path_for(&self, extension: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.prefix, extension))
    }

    /// Number of completed write passes
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Recomputes derived attributes and rewrites every export
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph; sizes and community labels are updated in place
    /// * `session` - Supplies the crawl-wide minimum "cited by" count
    pub fn write(&mut self, graph: &mut CitationGraph, session: &CrawlSession) -> OutputResult<()> {
        graph.recompute_derived(session.min_cited_by());
        graph.clusterize();

        self.written.clear();
        for exporter in &self.exporters {
            for (suffix, contents) in exporter.render_files(graph)? {
                let path = self.path_for(suffix);
                write_atomic(&path, &contents)?;
                self.written.push(path);
            }
        }

        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.save(graph)?;
        }

        self.writes += 1;
        tracing::trace!(
            "Export pass {} ({} nodes, {} edges)",
            self.writes,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(())
    }

    /// Writes the final exports and records how the run ended
    ///
    /// The SQLite run is finalized even when the last write pass fails.
    pub fn finish(
        &mut self,
        graph: &mut CitationGraph,
        session: &CrawlSession,
        status: RunStatus,
    ) -> OutputResult<()> {
        let written = self.write(graph, session);

        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.finalize(status)?;
        }
        written?;

        for path in &self.written {
            tracing::info!("Wrote {}", path.display());
        }
        Ok(())
    }
}
