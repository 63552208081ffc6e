//! Crawler module for citation page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching with challenge waits and session resets
//! - Listing parsing and record extraction
//! - Depth-first traversal over "cited by" and pagination links
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod record;
mod retriever;

pub use coordinator::{run_crawl, CrawlEngine, CrawlOptions};
pub use extractor::{derive_year, extract_record, resolve_element_id, split_metadata};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use parser::{inspect_markup, parse_listing_page, PageInspection, ParsedPage};
pub use record::{CitationPair, CitationRecord, PageContext};
pub use retriever::{PageRetriever, RetrieverSettings};
