//! Crawler coordinator - depth-first citation traversal
//!
//! This module contains the crawl engine and the top-level crawl driver:
//! - Visiting a listing page at most once per crawl
//! - Following each record's "cited by" page while depth remains
//! - Following the "Next" link while pages remain
//! - Streaming (record, context) pairs into the graph and the exporters
//!
//! The traversal is an explicit work stack rather than recursion. Each page
//! on the stack keeps its unconsumed records; the record most recently yielded
//! may leave one pending visit (its citations page, or the page's successor)
//! which is taken before anything else, giving a pre-order depth-first walk:
//! a record, then its whole citation subtree, then its next sibling, and the
//! next results page only after every record of the current page.

use crate::config::{validate, Config};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::parse_listing_page;
use crate::crawler::record::{CitationPair, CitationRecord, PageContext};
use crate::crawler::retriever::{PageRetriever, RetrieverSettings};
use crate::graph::CitationGraph;
use crate::output::{CrawlStatistics, OutputCoordinator};
use crate::state::CrawlSession;
use crate::storage::RunStatus;
use crate::CiteError;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A listing page still being drained
#[derive(Debug)]
struct PageFrame {
    context: Option<PageContext>,
    records: VecDeque<CitationRecord>,
    depth: u32,
    pages: u32,
    next_page: Option<String>,
}

/// A page the traversal has decided to enter next
#[derive(Debug, Clone)]
struct PendingVisit {
    url: String,
    depth: u32,
    pages: u32,
}

/// Depth-first producer of citation pairs
///
/// The sequence is finite and not restartable: once `next_pair` has returned
/// `Ok(None)` or an error, every later call returns `Ok(None)`.
pub struct CrawlEngine<F: PageFetcher> {
    retriever: PageRetriever<F>,
    session: CrawlSession,
    base_url: Url,
    stack: Vec<PageFrame>,
    pending: Option<PendingVisit>,
    finished: bool,
}

impl<F: PageFetcher> CrawlEngine<F> {
    /// Creates an engine that will start at `start_url`
    ///
    /// # Arguments
    ///
    /// * `retriever` - Page retriever with its fetcher attached
    /// * `base_url` - Site root for resolving relative links
    /// * `start_url` - First listing page to visit
    /// * `depth` - Levels of "cited by" pages to follow below the start page
    /// * `pages` - Results pages to walk per listing, at least 1
    pub fn new(
        retriever: PageRetriever<F>,
        base_url: Url,
        start_url: &str,
        depth: u32,
        pages: u32,
    ) -> Self {
        Self {
            retriever,
            session: CrawlSession::new(),
            base_url,
            stack: Vec::new(),
            pending: Some(PendingVisit {
                url: start_url.to_string(),
                depth,
                pages: pages.max(1),
            }),
            finished: false,
        }
    }

    /// Crawl-wide state accumulated so far
    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    /// The underlying retriever (challenge and reset counters)
    pub fn retriever(&self) -> &PageRetriever<F> {
        &self.retriever
    }

    /// Produces the next (record, context) pair in depth-first order
    ///
    /// Returns `Ok(None)` once the traversal is exhausted.
    pub async fn next_pair(&mut self) -> Result<Option<CitationPair>, CiteError> {
        if self.finished {
            return Ok(None);
        }

        match self.advance().await {
            Ok(Some(pair)) => Ok(Some(pair)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                self.stack.clear();
                self.pending = None;
                Err(e)
            }
        }
    }

    async fn advance(&mut self) -> Result<Option<CitationPair>, CiteError> {
        loop {
            if let Some(visit) = self.pending.take() {
                self.visit(visit).await?;
                continue;
            }

            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some(record) = frame.records.pop_front() {
                if frame.depth > 0 {
                    if let Some(cited_by_url) = &record.cited_by_url {
                        self.pending = Some(PendingVisit {
                            url: cited_by_url.clone(),
                            depth: frame.depth - 1,
                            pages: frame.pages,
                        });
                    }
                }

                let context = frame.context.clone();
                self.session.records_yielded += 1;
                return Ok(Some((record, context)));
            }

            // Page drained; its successor continues at the same depth
            if let Some(frame) = self.stack.pop() {
                if frame.pages > 1 {
                    if let Some(next_page) = frame.next_page {
                        self.pending = Some(PendingVisit {
                            url: next_page,
                            depth: frame.depth,
                            pages: frame.pages - 1,
                        });
                    }
                }
            }
        }
    }

    /// Fetches and parses a page, pushing it onto the stack
    async fn visit(&mut self, visit: PendingVisit) -> Result<(), CiteError> {
        if self.session.is_visited(&visit.url) {
            tracing::debug!("Already visited {}", visit.url);
            return Ok(());
        }

        let content = self.retriever.retrieve(&visit.url).await?;
        self.session.mark_visited(&visit.url);
        self.session.pages_fetched += 1;

        let page = parse_listing_page(&content, &visit.url, &self.base_url, &mut self.session);
        self.session.elements_skipped += page.skipped as u64;

        tracing::info!(
            "Fetched {} ({} records, depth {}, pages {})",
            visit.url,
            page.records.len(),
            visit.depth,
            visit.pages
        );

        self.stack.push(PageFrame {
            context: page.context,
            records: page.records.into(),
            depth: visit.depth,
            pages: visit.pages,
            next_page: page.next_page,
        });

        Ok(())
    }
}

/// Options for a crawl run that do not come from the configuration file
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Listing page to start from
    pub start_url: String,

    /// Log every pair as JSON
    pub debug: bool,

    /// Human-readable invocation, embedded in the HTML view
    pub invocation: String,

    /// Hash of the configuration file, stored with SQLite runs
    pub config_hash: Option<String>,
}

/// Runs a complete crawl
///
/// Streams pairs from the engine into a `CitationGraph`, exporting every
/// enabled output format after each insertion so partial progress survives
/// an interrupt. Cancellation stops the crawl between pairs and is not an
/// error; the returned statistics report it.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fetcher` - Page fetcher to drive
/// * `cancel` - Token that stops the crawl when cancelled
/// * `options` - Start URL and run metadata
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl finished or was cancelled
/// * `Err(CiteError)` - Fatal transport, configuration or output failure
///
/// # Example
///
/// ```no_run
/// use cite_ripple::config::{Config, FetcherConfig};
/// use cite_ripple::crawler::{run_crawl, CrawlOptions, HttpFetcher};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let fetcher = HttpFetcher::new(config.fetcher.clone())?;
/// let options = CrawlOptions {
///     start_url: "https://scholar.google.com/scholar?cites=123".to_string(),
///     ..CrawlOptions::default()
/// };
/// let stats = run_crawl(&config, fetcher, CancellationToken::new(), options).await?;
/// println!("{} nodes", stats.nodes);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<F: PageFetcher>(
    config: &Config,
    fetcher: F,
    cancel: CancellationToken,
    options: CrawlOptions,
) -> Result<CrawlStatistics, CiteError> {
    validate(config)?;
    let base_url = Url::parse(&config.crawler.base_url)?;
    let retriever = PageRetriever::new(RetrieverSettings::from(&config.crawler), cancel.clone())
        .with_fetcher(fetcher);

    let mut engine = CrawlEngine::new(
        retriever,
        base_url,
        &options.start_url,
        config.crawler.depth,
        config.crawler.pages,
    );
    let mut graph = CitationGraph::new();
    let mut output = OutputCoordinator::new(
        &config.output,
        &options.invocation,
        options.config_hash.as_deref(),
    )?;

    tracing::info!(
        "Crawling {} (depth {}, pages {})",
        options.start_url,
        config.crawler.depth,
        config.crawler.pages
    );

    let mut interrupted = false;
    loop {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }

        let (record, context) = match engine.next_pair().await {
            Ok(Some(pair)) => pair,
            Ok(None) => break,
            Err(e) if e.is_cancelled() => {
                interrupted = true;
                break;
            }
            Err(e) => {
                flush_failed_run(&mut output, &mut graph, engine.session());
                return Err(e);
            }
        };

        if options.debug {
            tracing::info!("from: {}", serde_json::to_string(&record)?);
            if let Some(context) = &context {
                tracing::info!("to: {}", serde_json::to_string(context)?);
            }
        }

        if graph.insert(&record, context.as_ref()) {
            if let Some(context) = &context {
                tracing::info!("{} -> {}", record.id, context.id);
            }
        }

        if let Err(e) = output.write(&mut graph, engine.session()) {
            flush_failed_run(&mut output, &mut graph, engine.session());
            return Err(e.into());
        }
    }

    if interrupted {
        tracing::warn!("Crawl interrupted; exports reflect the graph collected so far");
    }
    let status = if interrupted {
        RunStatus::Interrupted
    } else {
        RunStatus::Completed
    };
    output.finish(&mut graph, engine.session(), status)?;

    Ok(CrawlStatistics::collect(
        engine.session(),
        engine.retriever().challenges_seen,
        engine.retriever().fetcher_resets,
        &graph,
        interrupted,
    ))
}

/// Writes what the graph holds after a fatal error and marks the run failed
fn flush_failed_run(
    output: &mut OutputCoordinator,
    graph: &mut CitationGraph,
    session: &CrawlSession,
) {
    if let Err(flush) = output.finish(graph, session, RunStatus::Failed) {
        tracing::error!("Failed to flush exports after crawl error: {}", flush);
    }
}
