//! End-of-crawl statistics
//!
//! This module gathers counters from the crawl session, the retriever and the
//! graph into one summary and prints it.

use crate::graph::CitationGraph;
use crate::state::CrawlSession;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Nodes in the citation graph
    pub nodes: usize,

    /// Citation edges in the graph
    pub edges: usize,

    /// Communities found by the last clustering
    pub communities: usize,

    /// Largest node size computed
    pub max_size: u32,

    /// Listing pages retrieved
    pub pages_fetched: u64,

    /// Records yielded by the crawl engine
    pub records_yielded: u64,

    /// Listing elements dropped for lack of an id
    pub elements_skipped: u64,

    /// Challenge polls waited through
    pub challenges_seen: u64,

    /// Fetcher sessions reset after a missing content region
    pub fetcher_resets: u64,

    /// True if the crawl stopped on cancellation
    pub interrupted: bool,
}

impl CrawlStatistics {
    /// Collects statistics at the end of a crawl
    ///
    /// # Arguments
    ///
    /// * `session` - The crawl session
    /// * `challenges_seen` - Challenge iterations reported by the retriever
    /// * `fetcher_resets` - Fetcher resets reported by the retriever
    /// * `graph` - The final graph
    /// * `interrupted` - Whether the crawl was cancelled
    pub fn collect(
        session: &CrawlSession,
        challenges_seen: u64,
        fetcher_resets: u64,
        graph: &CitationGraph,
        interrupted: bool,
    ) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            communities: if graph.is_empty() { 0 } else { graph.community_count() },
            max_size: graph.max_size(),
            pages_fetched: session.pages_fetched,
            records_yielded: session.records_yielded,
            elements_skipped: session.elements_skipped,
            challenges_seen,
            fetcher_resets,
            interrupted,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Graph:");
    println!("  Nodes: {}", stats.nodes);
    println!("  Citations: {}", stats.edges);
    println!("  Communities: {}", stats.communities);
    println!("  Largest node size: {}", stats.max_size);
    println!();

    println!("Crawl:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Records yielded: {}", stats.records_yielded);
    println!("  Elements skipped (no id): {}", stats.elements_skipped);
    println!("  Challenge waits: {}", stats.challenges_seen);
    println!("  Fetcher resets: {}", stats.fetcher_resets);
    println!();

    if stats.interrupted {
        println!("Status: interrupted (exports hold the partial graph)");
    } else {
        println!("Status: completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CitationRecord, PageContext};

    #[test]
    fn test_collect() {
        let mut session = CrawlSession::new();
        session.pages_fetched = 3;
        session.records_yielded = 2;

        let mut graph = CitationGraph::new();
        let context = PageContext {
            id: "root".to_string(),
            title: "Root".to_string(),
            cited_by_count: None,
        };
        graph.insert(&CitationRecord::new("a", "A"), Some(&context));
        graph.insert(&CitationRecord::new("b", "B"), Some(&context));
        graph.clusterize();

        let stats = CrawlStatistics::collect(&session, 4, 1, &graph, true);

        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.communities, 1);
        assert_eq!(stats.pages_fetched, 3);
        assert_eq!(stats.challenges_seen, 4);
        assert_eq!(stats.fetcher_resets, 1);
        assert!(stats.interrupted);
    }

    #[test]
    fn test_collect_empty_graph() {
        let graph = CitationGraph::new();
        let stats = CrawlStatistics::collect(&CrawlSession::new(), 0, 0, &graph, false);
        assert_eq!(stats, CrawlStatistics::default());
    }
}
