//! Evidence resolution for a single record.
//!
//! Flow:
//!   1. Find the first `PubMed search:` placeholder (none → unchanged)
//!   2. Strict search (study-design + humans + date filters)
//!   3. If nothing came back, one relaxed search without the study-design filter
//!   4. Batch summary fetch for whatever ids were found
//!   5. Normalise; at least one reference → auto_matched, else needs_review
//!
//! Source failures are not caught here; the enricher isolates them per record.

use anyhow::Context;
use tracing::{debug, instrument};

use crate::marker::first_placeholder;
use crate::models::{record_references, record_text, Record, Resolution};
use crate::normalise::normalise_summaries;
use crate::query::{build_query_for_year, build_relaxed_query_for_year, current_year};
use crate::sources::EvidenceSource;

/// Per-run resolution knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Maximum references kept per record.
    pub max_results: usize,
    /// Publication-date window in years; 0 disables the date filter.
    pub recency_years: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { max_results: 3, recency_years: 10 }
    }
}

pub struct EvidenceResolver<S> {
    source: S,
    settings: ResolverSettings,
}

impl<S: EvidenceSource> EvidenceResolver<S> {
    pub fn new(source: S, settings: ResolverSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> ResolverSettings {
        self.settings
    }

    #[instrument(skip_all, fields(title = record_text(record, "title")))]
    pub async fn resolve(&self, record: &Record) -> anyhow::Result<Resolution> {
        let original = record_references(record);
        let Some(hint) = first_placeholder(original) else {
            return Ok(Resolution::unchanged(original.to_vec()));
        };

        let title = record_text(record, "title");
        let goal = record_text(record, "goal");
        let ResolverSettings { max_results, recency_years } = self.settings;
        let year = current_year();

        let strict = build_query_for_year(title, goal, &hint, recency_years, year);
        let mut pmids = self.source
            .search_ids(&strict, max_results)
            .await
            .context("strict PubMed search failed")?;

        if pmids.is_empty() {
            debug!(%hint, "Strict query found nothing, relaxing publication types");
            let relaxed = build_relaxed_query_for_year(title, goal, &hint, recency_years, year);
            pmids = self.source
                .search_ids(&relaxed, max_results)
                .await
                .context("relaxed PubMed search failed")?;
        }

        if pmids.is_empty() {
            return Ok(Resolution::needs_review(original.to_vec()));
        }

        let summaries = self.source
            .fetch_summaries(&pmids)
            .await
            .context("PubMed summary fetch failed")?;
        let structured = normalise_summaries(&pmids, &summaries);
        debug!(found = pmids.len(), resolved = structured.len(), "Evidence resolved");

        if structured.is_empty() {
            Ok(Resolution::needs_review(original.to_vec()))
        } else {
            Ok(Resolution::matched(structured))
        }
    }
}
