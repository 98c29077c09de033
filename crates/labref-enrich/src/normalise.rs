//! Normalisation of raw PubMed summaries into [`Reference`] values.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{DocumentSummary, Reference};

fn doi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. "doi: 10.1016/j.sleep.2020.01.002." inside an elocationid
    RE.get_or_init(|| Regex::new(r"\b10\.\d{4,9}/\S+").expect("DOI pattern is valid"))
}

/// First DOI-shaped substring of a location identifier, without trailing `.;,`.
pub fn extract_doi(location: &str) -> Option<String> {
    doi_regex()
        .find(location)
        .map(|m| m.as_str().trim_end_matches(['.', ';', ',']).to_string())
        .filter(|doi| !doi.is_empty())
}

/// Trimmed title without its trailing full stop(s).
pub fn clean_title(title: &str) -> String {
    title.trim().trim_end_matches('.').to_string()
}

pub fn normalise_summary(pmid: &str, summary: &DocumentSummary) -> Reference {
    let text = |field: &Option<String>| field.as_deref().unwrap_or("").trim().to_string();
    let doi = summary.elocationid.as_deref().and_then(extract_doi);
    Reference::new(
        pmid,
        clean_title(summary.title.as_deref().unwrap_or("")),
        text(&summary.source),
        text(&summary.pubdate),
        doi,
    )
}

/// References for `pmids` in the given order; ids without a summary are skipped.
pub fn normalise_summaries(
    pmids: &[String],
    summaries: &HashMap<String, DocumentSummary>,
) -> Vec<Reference> {
    pmids
        .iter()
        .filter_map(|pmid| summaries.get(pmid).map(|s| normalise_summary(pmid, s)))
        .collect()
}
