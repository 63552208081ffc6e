//! Bibliographic records produced by the crawler

use serde::Serialize;

/// One bibliographic entry seen on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationRecord {
    /// Cluster id, "cited by" id, or a page-local fallback id
    pub id: String,

    /// Link to the work itself; absent when the listing shows a plain label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Count from the "Cited by N" action link
    #[serde(rename = "cited_by", skip_serializing_if = "Option::is_none")]
    pub cited_by_count: Option<u64>,

    /// Absolute URL of the "Cited by N" listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cited_by_url: Option<String>,

    /// Id of the work whose citation page listed this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// 1-based order in which `parent_id` was first encountered in the crawl
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,
}

impl CitationRecord {
    /// Creates a record with only its identity fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
            title: title.into(),
            authors: None,
            year: None,
            cited_by_count: None,
            cited_by_url: None,
            parent_id: None,
            group_index: None,
        }
    }
}

/// The work being cited by every record on a citations page
///
/// Absent for generic search-result pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub id: String,
    pub title: String,

    /// Total result count from the page summary line
    #[serde(rename = "cited_by", skip_serializing_if = "Option::is_none")]
    pub cited_by_count: Option<u64>,
}

/// A record together with the page context it was listed under
///
/// When a context is present the pair denotes the edge `record -> context`
/// ("record cites context").
pub type CitationPair = (CitationRecord, Option<PageContext>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_omits_absent_fields() {
        let mut record = CitationRecord::new("123", "Graph Crawling");
        record.year = Some("2020".to_string());
        record.cited_by_count = Some(7);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "123");
        assert_eq!(json["year"], "2020");
        assert_eq!(json["cited_by"], 7);
        assert!(json.get("url").is_none());
        assert!(json.get("group_index").is_none());
    }
}
