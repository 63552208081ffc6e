/// Retrieval state definitions for a single page load
///
/// A page load moves through these states while the retriever fetches a URL,
/// waits out challenge interstitials and recovers from blocked sessions.
use std::fmt;

/// Represents the current state of one page retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalState {
    /// No fetch in progress
    Idle,

    /// A fetch has been issued for the URL
    Fetching,

    /// A challenge marker is on the page; waiting for it to be cleared
    ChallengePresent,

    /// The page loaded but the main content region is missing
    ContentMissing,

    /// The fetcher session is being discarded and recreated
    FetcherReset,

    /// The content region was found and handed to the parser
    ContentReady,
}

impl RetrievalState {
    /// Checks whether moving to `next` is a legal step of the retrieval protocol
    ///
    /// ```text
    /// Idle -> Fetching -> ChallengePresent (loops) -> ...
    ///                  -> ContentMissing -> FetcherReset -> Fetching
    ///                  -> ContentReady -> Idle
    /// ```
    pub fn can_transition_to(&self, next: RetrievalState) -> bool {
        use RetrievalState::*;

        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, ChallengePresent)
                | (Fetching, ContentMissing)
                | (Fetching, ContentReady)
                | (ChallengePresent, ChallengePresent)
                | (ChallengePresent, ContentMissing)
                | (ChallengePresent, ContentReady)
                | (ContentMissing, FetcherReset)
                | (FetcherReset, Fetching)
                | (ContentReady, Idle)
        )
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::ChallengePresent => "challenge_present",
            Self::ContentMissing => "content_missing",
            Self::FetcherReset => "fetcher_reset",
            Self::ContentReady => "content_ready",
        }
    }
}

impl Default for RetrievalState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(RetrievalState::Idle.can_transition_to(RetrievalState::Fetching));
        assert!(RetrievalState::Fetching.can_transition_to(RetrievalState::ContentReady));
        assert!(RetrievalState::ContentReady.can_transition_to(RetrievalState::Idle));
    }

    #[test]
    fn test_challenge_loop() {
        assert!(RetrievalState::Fetching.can_transition_to(RetrievalState::ChallengePresent));
        assert!(
            RetrievalState::ChallengePresent.can_transition_to(RetrievalState::ChallengePresent)
        );
        assert!(RetrievalState::ChallengePresent.can_transition_to(RetrievalState::ContentReady));
    }

    #[test]
    fn test_reset_cycle() {
        assert!(RetrievalState::Fetching.can_transition_to(RetrievalState::ContentMissing));
        assert!(RetrievalState::ContentMissing.can_transition_to(RetrievalState::FetcherReset));
        assert!(RetrievalState::FetcherReset.can_transition_to(RetrievalState::Fetching));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!RetrievalState::Idle.can_transition_to(RetrievalState::ContentReady));
        assert!(!RetrievalState::ContentMissing.can_transition_to(RetrievalState::ContentReady));
        assert!(!RetrievalState::FetcherReset.can_transition_to(RetrievalState::ContentReady));
        assert!(!RetrievalState::ContentReady.can_transition_to(RetrievalState::Fetching));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RetrievalState::ChallengePresent), "challenge_present");
        assert_eq!(RetrievalState::default(), RetrievalState::Idle);
    }
}
