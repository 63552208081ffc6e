//! Integration tests for the crawler
//!
//! These tests use wiremock to serve mock citation listing pages and run the
//! full crawl cycle end-to-end through the reqwest fetcher.

use cite_ripple::config::Config;
use cite_ripple::crawler::{run_crawl, CrawlOptions, HttpFetcher};
use cite_ripple::storage::{RunStatus, SqliteStorage, Storage};
use cite_ripple::CiteError;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHALLENGE_PAGE: &str = r#"<html><body>
    <div id="gs_captcha_ccl"><form>Please show you're not a robot</form></div>
    </body></html>"#;

const BLOCKED_PAGE: &str = r#"<html><body>
    <h1>We're sorry...</h1><p>... but your computer or network may be sending automated queries.</p>
    </body></html>"#;

/// One listing element of a citations page
struct Entry<'a> {
    id: &'a str,
    cited_by: Option<u64>,
}

fn entry(id: &str) -> Entry<'_> {
    Entry { id, cited_by: None }
}

fn cited(id: &str, count: u64) -> Entry<'_> {
    Entry {
        id,
        cited_by: Some(count),
    }
}

/// Renders a citations page for `cited_id`
fn citations_page(cited_id: &str, total: u64, entries: &[Entry<'_>], next: Option<&str>) -> String {
    let mut listing = String::new();
    for entry in entries {
        let actions = match entry.cited_by {
            Some(count) => format!(
                r#"<a href="/scholar?cites={0}&amp;hl=en">Cited by {1}</a>
                   <a href="/scholar?q=related:{0}">Related articles</a>"#,
                entry.id, count
            ),
            None => format!(
                r#"<a href="/scholar?cluster={0}&amp;hl=en">All 2 versions</a>"#,
                entry.id
            ),
        };
        listing.push_str(&format!(
            r#"<div class="gs_r gs_or gs_scl" data-cid="local-{0}">
                 <h3 class="gs_rt"><a href="https://papers.example/{0}">Paper {0}</a></h3>
                 <div class="gs_a">Author {0}, B Coauthor - Journal of {0}, 2021 - papers.example</div>
                 <div class="gs_fl">{1}</div>
               </div>"#,
            entry.id, actions
        ));
    }

    let pagination = next
        .map(|href| format!(r#"<div id="gs_n"><a href="{}">Next</a></div>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body><div id="gs_top">
             <div id="gs_ab_md"><div class="gs_ab_mdw">About {total} results (0.02 sec)</div></div>
             <div id="gs_res_ccl_top"><h2><a href="/scholar?cluster={cited_id}">Work {cited_id}</a></h2></div>
             <div id="gs_res_ccl_mid">{listing}</div>
             {pagination}
           </div></body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a citations page answering `/scholar?cites=<cited_id>`
async fn mount_citations(
    server: &MockServer,
    cited_id: &str,
    total: u64,
    entries: &[Entry<'_>],
    expected_fetches: u64,
) {
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("cites", cited_id))
        .respond_with(html(citations_page(cited_id, total, entries, None)))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output_dir: &Path, depth: u32, pages: u32) -> Config {
    let mut config = Config::default();
    config.crawler.base_url = base_url.to_string();
    config.crawler.depth = depth;
    config.crawler.pages = pages;
    config.crawler.min_delay_ms = 0;
    config.crawler.max_delay_ms = 0;
    config.crawler.challenge_poll_ms = 1;
    config.fetcher.user_agent = "CiteRippleTest/1.0".to_string();
    config.output.prefix = output_dir.join("graph").to_string_lossy().into_owned();
    config
}

/// URL of a citations page, in the same form as the "Cited by" links
fn listing_url(base_url: &str, cited_id: &str) -> String {
    format!("{}/scholar?cites={}&hl=en", base_url, cited_id)
}

fn options(base_url: &str, cited_id: &str) -> CrawlOptions {
    CrawlOptions {
        start_url: listing_url(base_url, cited_id),
        debug: true,
        invocation: format!("cites={} (test)", cited_id),
        config_hash: Some("test-hash".to_string()),
    }
}

fn read_json(output_dir: &Path) -> Value {
    let text = std::fs::read_to_string(output_dir.join("graph.json")).expect("json export");
    serde_json::from_str(&text).expect("valid json")
}

fn node_ids(graph: &Value) -> Vec<String> {
    graph["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .map(|n| n["id"].as_str().expect("node id").to_string())
        .collect()
}

fn edge_ids(graph: &Value) -> Vec<(String, String)> {
    let ids = node_ids(graph);
    graph["links"]
        .as_array()
        .expect("links array")
        .iter()
        .map(|l| {
            let source = l["source"].as_u64().expect("source index") as usize;
            let target = l["target"].as_u64().expect("target index") as usize;
            (ids[source].clone(), ids[target].clone())
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_depth_first() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_citations(&server, "root", 1200, &[cited("A", 30), entry("B")], 1).await;
    mount_citations(&server, "A", 30, &[entry("A1"), entry("A2")], 1).await;

    let config = create_test_config(&base_url, dir.path(), 1, 1);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .expect("crawl succeeds");

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.records_yielded, 4);
    assert_eq!(stats.nodes, 5);
    assert_eq!(stats.edges, 4);
    assert!(!stats.interrupted);

    let graph = read_json(dir.path());
    assert_eq!(node_ids(&graph), vec!["A", "root", "A1", "A2", "B"]);
    assert_eq!(
        edge_ids(&graph),
        vec![
            ("A".to_string(), "root".to_string()),
            ("A1".to_string(), "A".to_string()),
            ("A2".to_string(), "A".to_string()),
            ("B".to_string(), "root".to_string()),
        ]
    );

    // record fields and derived attributes
    let nodes = graph["nodes"].as_array().unwrap();
    let a = &nodes[0];
    assert_eq!(a["title"], "Paper A");
    assert_eq!(a["url"], "https://papers.example/A");
    assert_eq!(a["authors"], "Author A, B Coauthor");
    assert_eq!(a["year"], "2021");
    assert_eq!(a["cited_by"], 30);
    assert_eq!(a["group_index"], 1);
    assert_eq!(nodes[2]["group_index"], 2);

    // root count 1200 against the crawl-wide minimum of 30
    let root = &nodes[1];
    assert_eq!(root["cited_by"], 1200);
    assert_eq!(root["size"], 6);
    assert_eq!(root["label"], "Work root");

    for ext in ["gexf", "graphml", "html", "nodes.csv"] {
        assert!(dir.path().join(format!("graph.{}", ext)).exists());
    }

    let edges = std::fs::read_to_string(dir.path().join("graph.edges.csv")).unwrap();
    let mut lines = edges.lines();
    assert_eq!(lines.next(), Some("source,target"));
    assert_eq!(lines.count(), graph["links"].as_array().unwrap().len());
}

#[tokio::test]
async fn test_each_url_fetched_once_on_cycles() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    // root and A cite each other; B appears on both pages
    mount_citations(&server, "root", 2, &[cited("A", 2), cited("B", 5)], 1).await;
    mount_citations(&server, "A", 2, &[cited("root", 2), cited("B", 5)], 1).await;
    mount_citations(&server, "B", 5, &[entry("C")], 1).await;

    let config = create_test_config(&base_url, dir.path(), 4, 1);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    assert_eq!(stats.pages_fetched, 3);

    let graph = read_json(dir.path());
    let edges = edge_ids(&graph);
    assert!(edges.contains(&("A".to_string(), "root".to_string())));
    assert!(edges.contains(&("root".to_string(), "A".to_string())));
    assert!(edges.contains(&("C".to_string(), "B".to_string())));

    // the mocks' expect(1) is verified when the server drops
}

#[tokio::test]
async fn test_pagination_follows_next_link() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    // the more specific mock is mounted first so it takes precedence
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "10"))
        .respond_with(html(citations_page("root", 3, &[entry("C")], None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("cites", "root"))
        .respond_with(html(citations_page(
            "root",
            3,
            &[entry("A"), entry("B")],
            Some("/scholar?start=10&amp;cites=root"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base_url, dir.path(), 0, 2);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(node_ids(&read_json(dir.path())), vec!["A", "root", "B", "C"]);
}

#[tokio::test]
async fn test_challenge_is_waited_out() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("cites", "root"))
        .respond_with(html(CHALLENGE_PAGE.to_string()))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_citations(&server, "root", 1, &[entry("A")], 1).await;

    let config = create_test_config(&base_url, dir.path(), 0, 1);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    assert_eq!(stats.challenges_seen, 2);
    assert_eq!(stats.fetcher_resets, 0);
    assert_eq!(stats.nodes, 2);
}

#[tokio::test]
async fn test_block_recovers_after_reset() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("cites", "root"))
        .respond_with(ResponseTemplate::new(429).set_body_string(BLOCKED_PAGE))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_citations(&server, "root", 1, &[entry("A")], 1).await;

    let config = create_test_config(&base_url, dir.path(), 0, 1);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    assert_eq!(stats.fetcher_resets, 1);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.nodes, 2);
}

#[tokio::test]
async fn test_repeated_block_is_fatal() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(403).set_body_string(BLOCKED_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url, dir.path(), 1, 1);
    config.output.sqlite = true;
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let result =
        run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root")).await;

    assert!(matches!(result, Err(CiteError::TransportBlock { .. })));

    // exports are still flushed, and the run is marked failed
    let graph = read_json(dir.path());
    assert!(node_ids(&graph).is_empty());

    let storage = SqliteStorage::new(&dir.path().join("graph.sqlite")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_search_page_has_no_context() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let page = r#"<html><body><div id="gs_top"><div id="gs_res_ccl_mid">
            <div class="gs_r" data-cid="x1"><h3 class="gs_rt"><a href="https://papers.example/x1">Search Hit</a></h3>
              <div class="gs_fl"><a href="/scholar?cites=x1">Cited by 4</a></div></div>
            <div class="gs_r"><h3 class="gs_rt">No identifier here</h3></div>
        </div></div></body></html>"#
        .to_string();
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("q", "graphs"))
        .respond_with(html(page))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base_url, dir.path(), 0, 1);
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let crawl_options = CrawlOptions {
        start_url: format!("{}/scholar?q=graphs", base_url),
        ..CrawlOptions::default()
    };
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), crawl_options)
        .await
        .unwrap();

    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.edges, 0);
    assert_eq!(stats.elements_skipped, 1);
    assert_eq!(node_ids(&read_json(dir.path())), vec!["x1"]);
}

#[tokio::test]
async fn test_sqlite_snapshot() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_citations(&server, "root", 10, &[cited("A", 10), entry("B")], 1).await;
    mount_citations(&server, "A", 10, &[entry("A1")], 1).await;

    let mut config = create_test_config(&base_url, dir.path(), 1, 1);
    config.output.sqlite = true;
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    let storage = SqliteStorage::new(&dir.path().join("graph.sqlite")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.invocation, "cites=root (test)");
    assert_eq!(storage.count_records(run.id).unwrap(), 4);
    assert_eq!(storage.count_citations(run.id).unwrap(), 3);

    let citing: Vec<String> = storage
        .get_citing_records(run.id, "root")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(citing, vec!["A", "B"]);
}

#[tokio::test]
async fn test_render_endpoint() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let start_url = listing_url(&base_url, "root");

    Mock::given(method("POST"))
        .and(path("/content"))
        .and(query_param("token", "secret"))
        .and(body_json(serde_json::json!({ "url": start_url })))
        .respond_with(html(citations_page("root", 1, &[entry("A")], None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url, dir.path(), 0, 1);
    config.fetcher.render_endpoint = Some(base_url.clone());
    config.fetcher.render_token = Some("secret".to_string());
    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, CancellationToken::new(), options(&base_url, "root"))
        .await
        .unwrap();

    assert_eq!(stats.nodes, 2);
}

#[tokio::test]
async fn test_cancelled_crawl_reports_interrupt() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = tempfile::tempdir().unwrap();

    // the challenge never clears
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(html(CHALLENGE_PAGE.to_string()))
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url, dir.path(), 1, 1);
    config.crawler.challenge_poll_ms = 10;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let fetcher = HttpFetcher::new(config.fetcher.clone()).unwrap();
    let stats = run_crawl(&config, fetcher, cancel, options(&base_url, "root"))
        .await
        .expect("cancellation is not an error");

    assert!(stats.interrupted);
    assert!(stats.challenges_seen >= 1);
    assert_eq!(stats.pages_fetched, 0);
    assert!(dir.path().join("graph.json").exists());
}
