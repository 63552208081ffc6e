//! Stable identifiers for citation listings
//!
//! The site groups every listing of the same work under a cluster id, exposed
//! as the `cluster` query parameter on version links and as `cites` on
//! "cited by" links. That id is the only key that stays stable across pages.

use url::Url;

/// Query parameters consulted for an identifier, in priority order
const ID_PARAMS: [&str; 2] = ["cluster", "cites"];

/// Extracts the cluster identifier from a URL
///
/// Reads the `cluster` query parameter, falling back to `cites`. A parameter
/// only counts when it appears exactly once; repeated parameters are ignored.
/// Relative URLs are accepted, since only the query string matters.
///
/// # Examples
///
/// ```
/// use cite_ripple::url::cluster_id_from_url;
///
/// assert_eq!(
///     cluster_id_from_url("https://scholar.google.com/scholar?cites=999&q=x"),
///     Some("999".to_string())
/// );
/// assert_eq!(cluster_id_from_url("/scholar?q=graphs"), None);
/// ```
pub fn cluster_id_from_url(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;

    ID_PARAMS
        .iter()
        .find_map(|param| single_query_value(&parsed, param))
}

/// Returns the value of a query parameter that occurs exactly once
fn single_query_value(url: &Url, name: &str) -> Option<String> {
    let mut values = url
        .query_pairs()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned());

    match (values.next(), values.next()) {
        (Some(value), None) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Parses absolute URLs directly and relative ones against a placeholder root
fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .ok()?
            .join(url)
            .ok(),
        Err(_) => None,
    }
}
