//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RetrievalState`: Tracks one page load through fetch, challenge and reset
//! - `CrawlSession`: Visited URLs, the "cited by" minimum and parent ordering
//!   for one crawl invocation

mod retrieval_state;
mod session;

// Re-export main types
pub use retrieval_state::RetrievalState;
pub use session::CrawlSession;
