use serde::Deserialize;

/// Main configuration structure for Cite-Ripple
///
/// Every section is optional in the TOML file; missing keys fall back to
/// the defaults used by the command-line tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl traversal and pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Levels of "cited by" pages to follow below the start page
    pub depth: u32,

    /// Result pages to walk on each listing (1 = only the first page)
    pub pages: u32,

    /// Site root used to resolve relative links found in listings
    pub base_url: String,

    /// Lower bound of the randomized delay before every fetch (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay before every fetch (milliseconds)
    pub max_delay_ms: u64,

    /// Interval between re-probes while a challenge is on screen (milliseconds)
    pub challenge_poll_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            pages: 1,
            base_url: "https://scholar.google.com".to_string(),
            min_delay_ms: 1_000,
            max_delay_ms: 5_000,
            challenge_poll_ms: 5_000,
        }
    }
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Rendering service base URL; pages are rendered through its `/content`
    /// endpoint when set, otherwise fetched directly
    pub render_endpoint: Option<String>,

    /// Token appended to rendering service requests
    pub render_token: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("cite-ripple/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            render_endpoint: None,
            render_token: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// File prefix for every export (`<prefix>.gexf`, `<prefix>.html`, ...)
    pub prefix: String,

    pub gexf: bool,
    pub graphml: bool,
    pub html: bool,
    pub json: bool,

    /// Node and edge tables (`<prefix>.nodes.csv`, `<prefix>.edges.csv`)
    pub csv: bool,

    /// Mirror the graph into a SQLite database (`<prefix>.sqlite`)
    pub sqlite: bool,
}

impl OutputConfig {
    /// Returns true if at least one export format is enabled
    pub fn any_enabled(&self) -> bool {
        self.gexf || self.graphml || self.html || self.json || self.csv || self.sqlite
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "output".to_string(),
            gexf: true,
            graphml: true,
            html: true,
            json: true,
            csv: true,
            sqlite: false,
        }
    }
}
