//! D3 node-link JSON exporter

use crate::graph::{CitationGraph, GraphNode};
use crate::output::traits::{GraphExporter, OutputResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Link {
    source: usize,
    target: usize,
}

#[derive(Debug, Serialize)]
struct NodeLinkData<'a> {
    nodes: &'a [GraphNode],
    links: Vec<Link>,
}

/// Serializes the graph as `{"nodes": [...], "links": [{"source", "target"}]}`
///
/// Link endpoints are zero-based positions in `nodes`, taken from the current
/// node order.
pub fn to_node_link_json(graph: &CitationGraph) -> OutputResult<String> {
    let data = NodeLinkData {
        nodes: graph.nodes(),
        links: graph
            .edges()
            .iter()
            .map(|&(source, target)| Link { source, target })
            .collect(),
    };
    Ok(serde_json::to_string(&data)?)
}

/// Writes `<prefix>.json`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl GraphExporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, graph: &CitationGraph) -> OutputResult<String> {
        to_node_link_json(graph)
    }
}
