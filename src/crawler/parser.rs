//! HTML parser for citation listing pages
//!
//! This module handles parsing rendered markup to extract:
//! - Whether a challenge interstitial is on screen
//! - The main content region of a loaded page
//! - The cited work a listing page is about (its `PageContext`)
//! - Every listing element, turned into a `CitationRecord`
//! - The "Next" pagination link
//!
//! Parsing is synchronous and returns owned data only: scraper documents are
//! never held across an await point.

use crate::crawler::extractor::extract_record;
use crate::crawler::record::{CitationRecord, PageContext};
use crate::state::CrawlSession;
use crate::url::{cluster_id_from_url, resolve_link};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Challenge interstitials (captcha form, recaptcha widget)
pub const CHALLENGE_SELECTOR: &str = "#gs_captcha_ccl, #recaptcha";
/// Main content region of every regular page
pub const CONTENT_SELECTOR: &str = "#gs_top";
/// Header link naming the work a citations page is about
pub const CONTEXT_SELECTOR: &str = "#gs_res_ccl_top a";
/// Summary line carrying the total result count
pub const SUMMARY_SELECTOR: &str = "#gs_ab_md .gs_ab_mdw";
/// One listing element per result
pub const LISTING_SELECTOR: &str = "#gs_res_ccl_mid .gs_r";
/// Pagination links
pub const PAGINATION_SELECTOR: &str = "#gs_n a";

static COUNT_AFTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+([0-9][0-9,]*)").expect("count pattern"));
static RESULT_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]*) results").expect("result count pattern"));

/// What a freshly loaded page turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageInspection {
    /// A challenge marker is present; the content is not served yet
    Challenge,

    /// No challenge, but the content region is missing too
    ContentMissing,

    /// Inner markup of the content region
    Content(String),
}

/// Owned result of parsing one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The cited work, when the page is a citations page
    pub context: Option<PageContext>,

    /// Extracted records in document order
    pub records: Vec<CitationRecord>,

    /// Listing elements dropped for lack of an identifier
    pub skipped: usize,

    /// Absolute URL of the next results page
    pub next_page: Option<String>,
}

/// Returns the first descendant of `element` matching `css`
pub fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

/// Returns every descendant of `element` matching `css`, in document order
pub fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Visible text of an element with whitespace runs collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds `<label> <number>` in `text` and returns the number
///
/// Thousands separators are accepted: `"Cited by 1,024"` yields 1024.
pub fn search_count(text: &str, label: &str) -> Option<u64> {
    text.match_indices(label).find_map(|(at, _)| {
        let rest = &text[at + label.len()..];
        parse_digits(COUNT_AFTER_LABEL.captures(rest)?.get(1)?.as_str())
    })
}

/// Parses a result summary such as "About 1,230 results (0.05 sec)"
pub fn parse_result_count(text: &str) -> Option<u64> {
    parse_digits(RESULT_COUNT.captures(text)?.get(1)?.as_str())
}

fn parse_digits(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse().ok()
}

/// Classifies freshly fetched markup
///
/// A challenge marker wins over everything else; otherwise the inner markup of
/// the content region is returned, or `ContentMissing` if there is none.
pub fn inspect_markup(markup: &str) -> PageInspection {
    let document = Html::parse_document(markup);
    let root = document.root_element();

    if select_first(root, CHALLENGE_SELECTOR).is_some() {
        return PageInspection::Challenge;
    }

    match select_first(root, CONTENT_SELECTOR) {
        Some(content) => PageInspection::Content(content.inner_html()),
        None => PageInspection::ContentMissing,
    }
}

/// Parses a listing page into its context, records and next-page link
///
/// # Arguments
///
/// * `content` - Markup of the page's content region
/// * `page_url` - URL the page was fetched from (source of the context id)
/// * `base_url` - Site root for resolving relative links
/// * `session` - Crawl state receiving parent ordering and count observations
pub fn parse_listing_page(
    content: &str,
    page_url: &str,
    base_url: &Url,
    session: &mut CrawlSession,
) -> ParsedPage {
    let document = Html::parse_document(content);
    let root = document.root_element();

    let context = extract_context(root, page_url);
    if let Some(count) = context.as_ref().and_then(|c| c.cited_by_count) {
        session.observe_cited_by(count);
    }

    let mut records = Vec::new();
    let mut skipped = 0;

    for element in select_all(root, LISTING_SELECTOR) {
        match extract_record(element, context.as_ref(), base_url, session) {
            Some(record) => {
                if let Some(count) = record.cited_by_count {
                    session.observe_cited_by(count);
                }
                records.push(record);
            }
            None => {
                tracing::debug!("Skipping listing element without identifier on {}", page_url);
                skipped += 1;
            }
        }
    }

    let next_page = select_all(root, PAGINATION_SELECTOR)
        .into_iter()
        .find(|link| element_text(*link) == "Next")
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| resolve_link(href, base_url));

    ParsedPage {
        context,
        records,
        skipped,
        next_page,
    }
}

/// Resolves the cited work from the page header
///
/// Generic search pages carry no header link and yield `None`; so do pages
/// whose URL has no cluster/cites id, since the context could not join the
/// graph without one.
fn extract_context(root: ElementRef<'_>, page_url: &str) -> Option<PageContext> {
    let header = select_first(root, CONTEXT_SELECTOR)?;

    let Some(id) = cluster_id_from_url(page_url) else {
        tracing::debug!("Citations header found but no id in {}", page_url);
        return None;
    };

    let cited_by_count = select_first(root, SUMMARY_SELECTOR)
        .and_then(|summary| parse_result_count(&element_text(summary)));

    Some(PageContext {
        id,
        title: element_text(header),
        cited_by_count,
    })
}
