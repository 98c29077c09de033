//! Data models for reference enrichment.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A protocol entry as found in the input document.
///
/// Kept as a raw JSON object so fields this crate does not know about are
/// written back untouched and in their original order.
pub type Record = Map<String, Value>;

/// Base of the public PubMed article pages.
pub const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Canonical citation built from a PubMed summary.
///
/// Serialized with the keys the consuming app already reads
/// (`pmid`, `doi`, `title`, `journal`, `pubdate`, `url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "pmid")]
    pub id: String,
    #[serde(rename = "doi")]
    pub external_link_id: Option<String>,
    pub title: String,
    #[serde(rename = "journal")]
    pub source_name: String,
    #[serde(rename = "pubdate")]
    pub publication_date: String,
    pub url: String,
}

impl Reference {
    /// Builds a reference; the url is always derived from `id`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_name: impl Into<String>,
        publication_date: impl Into<String>,
        external_link_id: Option<String>,
    ) -> Self {
        let id = id.into();
        let url = article_url(&id);
        Self {
            id,
            external_link_id,
            title: title.into(),
            source_name: source_name.into(),
            publication_date: publication_date.into(),
            url,
        }
    }

    /// Human-readable one-line citation stored in `references`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PMID: {} | ", self.id)?;
        if let Some(doi) = &self.external_link_id {
            write!(f, "DOI: {} | ", doi)?;
        }
        write!(
            f,
            "{} | {} ({}) | {}",
            self.title, self.source_name, self.publication_date, self.url
        )
    }
}

/// PubMed page for a PMID.
pub fn article_url(pmid: &str) -> String {
    format!("{}/{}/", PUBMED_ARTICLE_URL, pmid)
}

/// Raw per-document detail returned by a summary fetch, before normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub title: Option<String>,
    /// Journal abbreviation.
    pub source: Option<String>,
    pub pubdate: Option<String>,
    /// Free-text location identifier, e.g. `"doi: 10.1000/xyz. eCollection 2021"`.
    pub elocationid: Option<String>,
}

/// Outcome of matching one record against the literature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// No placeholder; the record is left as it was.
    Unchanged,
    AutoMatched,
    NeedsReview,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Unchanged   => "unchanged",
            MatchStatus::AutoMatched => "auto_matched",
            MatchStatus::NeedsReview => "needs_review",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the resolver hands back for a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Rendered citations, or the record's original entries when nothing matched.
    pub references: Vec<Value>,
    pub structured: Vec<Reference>,
    pub status: MatchStatus,
}

impl Resolution {
    pub fn unchanged(references: Vec<Value>) -> Self {
        Self { references, structured: Vec::new(), status: MatchStatus::Unchanged }
    }

    pub fn needs_review(references: Vec<Value>) -> Self {
        Self { references, structured: Vec::new(), status: MatchStatus::NeedsReview }
    }

    /// Renders every reference; caller guarantees `structured` is non-empty.
    pub fn matched(structured: Vec<Reference>) -> Self {
        let references = structured.iter().map(|r| Value::String(r.render())).collect();
        Self { references, structured, status: MatchStatus::AutoMatched }
    }
}

/// Text field of a record, empty when absent or not a string.
pub fn record_text<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

/// The record's `references` entries; anything but an array reads as empty.
pub fn record_references(record: &Record) -> &[Value] {
    record
        .get("references")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
