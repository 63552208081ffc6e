//! CSV node and edge tables

use crate::graph::CitationGraph;
use crate::output::traits::{GraphExporter, OutputError, OutputResult};
use csv::Writer;

const NODE_COLUMNS: [&str; 7] = [
    "id",
    "url",
    "title",
    "authors",
    "year",
    "cited_by",
    "cited_by_url",
];

const EDGE_COLUMNS: [&str; 2] = ["source", "target"];

/// Writes `<prefix>.nodes.csv` and `<prefix>.edges.csv`
///
/// Edges run from the citing work (`source`) to the cited one (`target`).
/// Absent values are written as empty fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl CsvExporter {
    fn nodes_table(&self, graph: &CitationGraph) -> OutputResult<String> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(NODE_COLUMNS)?;
        for node in graph.nodes() {
            let cited_by = node.cited_by.map(|c| c.to_string()).unwrap_or_default();
            writer.write_record([
                node.id.as_str(),
                node.url.as_deref().unwrap_or_default(),
                node.title.as_str(),
                node.authors.as_deref().unwrap_or_default(),
                node.year.as_deref().unwrap_or_default(),
                cited_by.as_str(),
                node.cited_by_url.as_deref().unwrap_or_default(),
            ])?;
        }
        finish_table(writer)
    }

    fn edges_table(&self, graph: &CitationGraph) -> OutputResult<String> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(EDGE_COLUMNS)?;
        for (source, target) in graph.edge_ids() {
            writer.write_record([source, target])?;
        }
        finish_table(writer)
    }
}

fn finish_table(writer: Writer<Vec<u8>>) -> OutputResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Format(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}

impl GraphExporter for CsvExporter {
    fn extension(&self) -> &'static str {
        "nodes.csv"
    }

    fn render(&self, graph: &CitationGraph) -> OutputResult<String> {
        self.nodes_table(graph)
    }

    fn render_files(&self, graph: &CitationGraph) -> OutputResult<Vec<(&'static str, String)>> {
        Ok(vec![
            ("nodes.csv", self.nodes_table(graph)?),
            ("edges.csv", self.edges_table(graph)?),
        ])
    }
}
