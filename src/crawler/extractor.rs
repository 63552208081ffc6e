//! Record extraction from a single listing element
//!
//! All metadata fields are independently optional. Only a missing identifier
//! makes an element unusable; malformed author/source lines simply leave
//! those fields empty.

use crate::crawler::parser::{element_text, search_count, select_all, select_first};
use crate::crawler::record::{CitationRecord, PageContext};
use crate::state::CrawlSession;
use crate::url::{cluster_id_from_url, resolve_link};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;
use url::Url;

/// Action links under a listing ("Cited by N", "All N versions", ...)
const ACTION_LINKS: &str = ".gs_fl a";
const TITLE_LINK: &str = ".gs_rt a";
const CITATION_ONLY_TITLE: &str = ".gs_rt .gs_ctu";
const TITLE_BLOCK: &str = ".gs_rt";
const METADATA_LINE: &str = ".gs_a";

/// Page-local id attribute carried by every listing element
const LOCAL_ID_ATTR: &str = "data-cid";

/// Separator between authors, source and venue: a hyphen or dash with a
/// non-word character on each side
static METADATA_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\\W[-\u{2013}\u{2014}]\\W").expect("metadata separator pattern")
});

/// Parses one listing element into a record
///
/// Returns `None` when no identifier can be resolved. When a context is
/// given, its id becomes the record's parent and is registered with the
/// session to obtain the record's group index.
pub fn extract_record(
    element: ElementRef<'_>,
    context: Option<&PageContext>,
    base_url: &Url,
    session: &mut CrawlSession,
) -> Option<CitationRecord> {
    let id = resolve_element_id(element)?;

    let (url, title) = match select_first(element, TITLE_LINK) {
        Some(link) => (
            link.value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url)),
            element_text(link),
        ),
        None => {
            let title = select_first(element, CITATION_ONLY_TITLE)
                .or_else(|| select_first(element, TITLE_BLOCK))
                .map(element_text)
                .unwrap_or_default();
            (None, title)
        }
    };

    let (authors, source) = select_first(element, METADATA_LINE)
        .map(|meta| split_metadata(&element_text(meta)))
        .unwrap_or((None, None));
    let year = source.as_deref().map(derive_year);

    let mut record = CitationRecord::new(id, title);
    record.url = url;
    record.authors = authors;
    record.year = year;

    if let Some(link) = select_all(element, ACTION_LINKS)
        .into_iter()
        .find(|link| element_text(*link).contains("Cited by"))
    {
        record.cited_by_count = search_count(&element_text(link), "Cited by");
        record.cited_by_url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url));
    }

    if let Some(context) = context {
        record.group_index = Some(session.group_index(&context.id));
        record.parent_id = Some(context.id.clone());
    }

    Some(record)
}

/// Resolves the identifier of a listing element
///
/// The first action link labelled "Cited by" or "versions" decides: its URL's
/// cluster/cites id is used, and if that URL carries none the element has no
/// id. Only elements without such a link fall back to the page-local
/// `data-cid` attribute, which is stable within a page but not across pages.
pub fn resolve_element_id(element: ElementRef<'_>) -> Option<String> {
    let id_link = select_all(element, ACTION_LINKS).into_iter().find(|link| {
        let label = element_text(*link);
        label.contains("Cited by") || label.contains("versions")
    });

    match id_link {
        Some(link) => link.value().attr("href").and_then(cluster_id_from_url),
        None => element
            .value()
            .attr(LOCAL_ID_ATTR)
            .map(str::trim)
            .filter(|cid| !cid.is_empty())
            .map(str::to_string),
    }
}

/// Splits a metadata line into (authors, source)
///
/// `"Smith, J - Journal of Tests, 2020 - example.com"` has three parts; the
/// trailing venue is discarded. Two parts map to authors and source. Any
/// other shape leaves both absent.
pub fn split_metadata(meta: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<String> = METADATA_SEPARATOR
        .split(meta)
        .map(|part| part.trim().to_string())
        .collect();

    match parts.as_slice() {
        [authors, source] | [authors, source, _] => {
            (Some(authors.clone()), Some(source.clone()))
        }
        _ => {
            tracing::trace!("Metadata line has {} parts: {:?}", parts.len(), meta);
            (None, None)
        }
    }
}

/// Derives the year from a source string
///
/// The trailing comma-delimited token when there is a comma, otherwise the
/// whole source.
pub fn derive_year(source: &str) -> String {
    match source.rsplit_once(',') {
        Some((_, year)) => year.trim().to_string(),
        None => source.trim().to_string(),
    }
}
