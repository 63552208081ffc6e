//! URL handling module for Cite-Ripple
//!
//! This module provides identifier extraction from listing URLs and the
//! resolution of relative listing links against the site root.

mod identifier;

pub use identifier::cluster_id_from_url;

use url::Url;

/// Resolves a listing href to an absolute URL
///
/// Listings link with site-relative paths (`/scholar?cites=...`), so they are
/// joined onto the configured site root. Empty hrefs, fragment-only anchors
/// and non-HTTP(S) schemes resolve to `None`.
///
/// # Examples
///
/// ```
/// use cite_ripple::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://scholar.google.com").unwrap();
/// assert_eq!(
///     resolve_link("/scholar?cites=7", &base),
///     Some("https://scholar.google.com/scholar?cites=7".to_string())
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
