//! Crawl-wide mutable state
//!
//! Everything that must persist across recursive steps of one crawl lives
//! here and is passed explicitly to the engine, so independent crawls never
//! share state.

use std::collections::{HashMap, HashSet};

/// State shared by every step of a single crawl invocation
#[derive(Debug, Clone, Default)]
pub struct CrawlSession {
    /// Page URLs already fetched; never shrinks
    visited: HashSet<String>,

    /// Smallest "cited by" count observed so far
    min_cited_by: Option<u64>,

    /// Distinct parent ids in first-seen order
    parent_order: Vec<String>,

    /// Parent id -> 1-based position in `parent_order`
    parent_index: HashMap<String, usize>,

    /// Number of pages fetched
    pub pages_fetched: u64,

    /// Number of (record, context) pairs produced
    pub records_yielded: u64,

    /// Listing elements dropped because no identifier resolved
    pub elements_skipped: u64,
}

impl CrawlSession {
    /// Creates an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the URL has already been fetched in this crawl
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Marks a URL as fetched
    ///
    /// Returns false if it had already been marked.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Number of distinct URLs fetched
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Folds a "cited by" count into the crawl-wide minimum
    pub fn observe_cited_by(&mut self, count: u64) {
        self.min_cited_by = Some(match self.min_cited_by {
            Some(current) => current.min(count),
            None => count,
        });
    }

    /// Smallest "cited by" count observed so far
    pub fn min_cited_by(&self) -> Option<u64> {
        self.min_cited_by
    }

    /// Returns the 1-based group index of a parent id, registering it if new
    ///
    /// Indices are assigned in first-seen order and never change afterwards.
    pub fn group_index(&mut self, parent_id: &str) -> usize {
        if let Some(index) = self.parent_index.get(parent_id) {
            return *index;
        }

        self.parent_order.push(parent_id.to_string());
        let index = self.parent_order.len();
        self.parent_index.insert(parent_id.to_string(), index);
        index
    }

    /// Distinct parent ids in the order they were first encountered
    pub fn parents(&self) -> &[String] {
        &self.parent_order
    }
}
