//! Page retrieval protocol
//!
//! Every fetch is preceded by a randomized delay. A page showing a challenge
//! marker is re-probed on a fixed interval until someone clears the challenge
//! out-of-band; there is no upper bound on that wait, but it honours the
//! crawl's cancellation token. A page missing its content region gets one
//! fetcher reset per call before the block is reported as fatal.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{inspect_markup, PageInspection};
use crate::state::RetrievalState;
use crate::CiteError;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pacing used by the retriever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverSettings {
    /// Lower bound of the pre-fetch delay
    pub min_delay: Duration,

    /// Upper bound of the pre-fetch delay
    pub max_delay: Duration,

    /// Interval between challenge re-probes
    pub challenge_poll: Duration,
}

impl From<&CrawlerConfig> for RetrieverSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            challenge_poll: Duration::from_millis(config.challenge_poll_ms),
        }
    }
}

/// Fetches pages through a `PageFetcher` and waits out anti-automation blocks
pub struct PageRetriever<F: PageFetcher> {
    fetcher: Option<F>,
    settings: RetrieverSettings,
    cancel: CancellationToken,
    state: RetrievalState,

    /// Challenge iterations waited through
    pub challenges_seen: u64,

    /// Fetcher sessions discarded after a missing content region
    pub fetcher_resets: u64,
}

impl<F: PageFetcher> PageRetriever<F> {
    /// Creates a retriever without a fetcher
    ///
    /// A fetcher must be attached with [`PageRetriever::with_fetcher`] before
    /// the first retrieval; until then every call fails with
    /// `CiteError::FetcherNotInitialized`.
    pub fn new(settings: RetrieverSettings, cancel: CancellationToken) -> Self {
        Self {
            fetcher: None,
            settings,
            cancel,
            state: RetrievalState::Idle,
            challenges_seen: 0,
            fetcher_resets: 0,
        }
    }

    /// Attaches the fetcher, builder style
    pub fn with_fetcher(mut self, fetcher: F) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// The attached fetcher, if any
    pub fn fetcher(&self) -> Option<&F> {
        self.fetcher.as_ref()
    }

    /// Current protocol state
    pub fn state(&self) -> RetrievalState {
        self.state
    }

    /// Retrieves `url` and returns the markup of its content region
    ///
    /// # Errors
    ///
    /// * `FetcherNotInitialized` - no fetcher attached
    /// * `TransportBlock` - content region still missing after one reset
    /// * `Cancelled` - the cancellation token fired during a wait
    /// * any transport error from the fetcher
    pub async fn retrieve(&mut self, url: &str) -> Result<String, CiteError> {
        if self.fetcher.is_none() {
            return Err(CiteError::FetcherNotInitialized);
        }

        let result = self.run_protocol(url).await;
        if result.is_err() {
            self.state = RetrievalState::Idle;
        }
        result
    }

    async fn run_protocol(&mut self, url: &str) -> Result<String, CiteError> {
        let mut reset_used = false;

        loop {
            self.politeness_delay(url).await?;

            self.transition(RetrievalState::Fetching);
            tracing::debug!("Fetching {}", url);
            let mut markup = self.fetcher_mut()?.fetch(url).await?;

            loop {
                match inspect_markup(&markup) {
                    PageInspection::Challenge => {
                        self.transition(RetrievalState::ChallengePresent);
                        self.challenges_seen += 1;
                        tracing::warn!(
                            "Challenge on {} - solve it in the browser session, re-checking in {:?}",
                            url,
                            self.settings.challenge_poll
                        );
                        self.wait(self.settings.challenge_poll, url).await?;
                        markup = self.fetcher_mut()?.probe(url).await?;
                    }
                    PageInspection::Content(content) => {
                        self.transition(RetrievalState::ContentReady);
                        self.transition(RetrievalState::Idle);
                        return Ok(content);
                    }
                    PageInspection::ContentMissing => {
                        self.transition(RetrievalState::ContentMissing);

                        if reset_used {
                            tracing::error!("Still blocked after fetcher reset: {}", url);
                            return Err(CiteError::TransportBlock {
                                url: url.to_string(),
                            });
                        }

                        tracing::warn!("Site has blocked this session, reopening ({})", url);
                        self.transition(RetrievalState::FetcherReset);
                        self.fetcher_mut()?.reset().await?;
                        self.fetcher_resets += 1;
                        reset_used = true;
                        break;
                    }
                }
            }
        }
    }

    fn fetcher_mut(&mut self) -> Result<&mut F, CiteError> {
        self.fetcher.as_mut().ok_or(CiteError::FetcherNotInitialized)
    }

    /// Sleeps a random duration within the configured bounds
    ///
    /// An upper bound below the lower one is treated as equal to it.
    async fn politeness_delay(&self, url: &str) -> Result<(), CiteError> {
        let min = self.settings.min_delay.as_millis() as u64;
        let max = (self.settings.max_delay.as_millis() as u64).max(min);
        if max == 0 {
            return Ok(());
        }

        let millis = rand::thread_rng().gen_range(min..=max);
        tracing::trace!("Waiting {}ms before fetching {}", millis, url);
        self.wait(Duration::from_millis(millis), url).await
    }

    /// Sleeps unless the crawl is cancelled first
    async fn wait(&self, duration: Duration, url: &str) -> Result<(), CiteError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CiteError::Cancelled { url: url.to_string() }),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn transition(&mut self, next: RetrievalState) {
        if !self.state.can_transition_to(next) {
            tracing::debug!("Unexpected retrieval transition {} -> {}", self.state, next);
        }
        tracing::trace!("Retrieval {} -> {}", self.state, next);
        self.state = next;
    }
}
