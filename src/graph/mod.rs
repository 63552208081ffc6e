//! Directed citation graph
//!
//! Nodes are keyed by record id and kept in insertion order, which is also the
//! order exporters write them in. An edge `a -> b` means "a cites b". The
//! first insertion of an id wins; later sightings never overwrite attributes.

mod community;

pub use community::{community_labels, greedy_modularity_communities};

use crate::crawler::{CitationRecord, PageContext};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A work in the citation graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,

    /// Display label, mirrors the title
    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cited_by: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cited_by_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,

    /// Derived from `cited_by`, always at least 1
    pub size: u32,

    /// Community label from the last `clusterize`
    pub community: usize,
}

impl GraphNode {
    fn from_record(record: &CitationRecord) -> Self {
        Self {
            id: record.id.clone(),
            label: record.title.clone(),
            url: record.url.clone(),
            title: record.title.clone(),
            authors: record.authors.clone(),
            year: record.year.clone(),
            cited_by: record.cited_by_count,
            cited_by_url: record.cited_by_url.clone(),
            parent_id: record.parent_id.clone(),
            group_index: record.group_index,
            size: 1,
            community: 0,
        }
    }

    fn from_context(context: &PageContext) -> Self {
        Self {
            id: context.id.clone(),
            label: context.title.clone(),
            url: None,
            title: context.title.clone(),
            authors: None,
            year: None,
            cited_by: context.cited_by_count,
            cited_by_url: None,
            parent_id: None,
            group_index: None,
            size: 1,
            community: 0,
        }
    }
}

/// Citation graph built incrementally from crawl pairs
#[derive(Debug, Clone, Default)]
pub struct CitationGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    edge_set: HashSet<(usize, usize)>,
    max_size: u32,
}

impl CitationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record and, with a context, the edge `record -> context`
    ///
    /// Returns `true` when a new edge was added. Records or contexts with an
    /// empty id are not inserted.
    pub fn insert(&mut self, record: &CitationRecord, context: Option<&PageContext>) -> bool {
        if record.id.is_empty() {
            tracing::debug!("Dropping record without id: {:?}", record.title);
            return false;
        }

        let from = self.add_node(|| GraphNode::from_record(record), &record.id);

        let Some(context) = context.filter(|c| !c.id.is_empty()) else {
            return false;
        };
        let to = self.add_node(|| GraphNode::from_context(context), &context.id);

        if self.edge_set.insert((from, to)) {
            self.edges.push((from, to));
            true
        } else {
            false
        }
    }

    fn add_node(&mut self, build: impl FnOnce() -> GraphNode, id: &str) -> usize {
        if let Some(&position) = self.index.get(id) {
            return position;
        }
        let position = self.nodes.len();
        self.nodes.push(build());
        self.index.insert(id.to_string(), position);
        position
    }

    /// Recomputes node sizes
    ///
    /// `size = floor(sqrt(cited_by / min))` where `min` is `global_min` or,
    /// when the caller tracks none, the smallest count present in the graph.
    /// Nodes without a count get size 1, and every size is at least 1.
    pub fn recompute_derived(&mut self, global_min: Option<u64>) {
        let min = global_min
            .or_else(|| self.nodes.iter().filter_map(|n| n.cited_by).min())
            .unwrap_or(1)
            .max(1);

        for node in &mut self.nodes {
            node.size = match node.cited_by {
                Some(count) => ((count as f64 / min as f64).sqrt().floor() as u32).max(1),
                None => 1,
            };
            self.max_size = self.max_size.max(node.size);
        }
    }

    /// Assigns a community label to every node
    pub fn clusterize(&mut self) {
        let labels = community_labels(self.nodes.len(), &self.edges);
        for (node, label) in self.nodes.iter_mut().zip(labels) {
            node.community = label;
        }
    }

    /// Largest size computed so far
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Number of distinct communities among the current labels
    pub fn community_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.community)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges as (from, to) positions into `nodes()`
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Edges as (from id, to id)
    pub fn edge_ids(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .map(move |&(from, to)| (self.nodes[from].id.as_str(), self.nodes[to].id.as_str()))
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
