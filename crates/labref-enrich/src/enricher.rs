//! Batch enrichment of every record in a protocols document.
//!
//! Records are processed strictly in order, one at a time, with a fixed
//! pause after each so the literature service's rate limit is respected.
//! A failing record is marked `needs_review` with its error text and the run
//! moves on; only a malformed document aborts.

use chrono::{DateTime, Utc};
use labref_common::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::document::protocols_mut;
use crate::models::{MatchStatus, Record, Resolution};
use crate::resolver::EvidenceResolver;
use crate::sources::EvidenceSource;

/// Provenance appended to the document's `note`.
pub const PROVENANCE_NOTE: &str = "References enriched via PubMed E-utilities.";

/// Pause between records; keeps a single client under ~3 requests/second.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(340);

const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Result of resolving one record, as seen at the record boundary.
#[derive(Debug)]
pub enum RecordOutcome {
    Success(Resolution),
    Failure(String),
}

/// Run-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    /// Records whose enrichment fields were (re)written, matched or not.
    pub enriched: usize,
    pub needs_review: usize,
}

pub struct Enricher<S> {
    resolver: EvidenceResolver<S>,
    delay: Duration,
}

impl<S: EvidenceSource> Enricher<S> {
    pub fn new(resolver: EvidenceResolver<S>, delay: Duration) -> Self {
        Self { resolver, delay }
    }

    pub fn resolver(&self) -> &EvidenceResolver<S> {
        &self.resolver
    }

    /// Resolves one record, turning any error into [`RecordOutcome::Failure`].
    pub async fn process_record(&self, record: &Record) -> RecordOutcome {
        match self.resolver.resolve(record).await {
            Ok(resolution) => RecordOutcome::Success(resolution),
            Err(e) => RecordOutcome::Failure(format!("{:#}", e)),
        }
    }

    pub async fn run(&self, document: &mut Value) -> Result<RunSummary> {
        self.run_with_progress(document, |_, _| {}).await
    }

    /// Enriches every record in place, then stamps `generated_at` and `note`.
    ///
    /// `on_record(done, total)` is called after each record.
    pub async fn run_with_progress<F>(&self, document: &mut Value, mut on_record: F) -> Result<RunSummary>
    where
        F: FnMut(usize, usize),
    {
        let protocols = protocols_mut(document)?;
        let total = protocols.len();
        let mut summary = RunSummary { total, ..RunSummary::default() };
        info!(total, delay_ms = self.delay.as_millis() as u64, "Enriching protocols");

        for (index, entry) in protocols.iter_mut().enumerate() {
            match entry.as_object_mut() {
                Some(record) => {
                    let outcome = self.process_record(record).await;
                    if let RecordOutcome::Failure(ref error) = outcome {
                        warn!(index, %error, "Reference enrichment failed");
                    }
                    apply_outcome(record, outcome, &mut summary);
                }
                None => warn!(index, "Skipping protocol entry that is not an object"),
            }
            on_record(index + 1, total);
            tokio::time::sleep(self.delay).await;
        }

        stamp_document(document, Utc::now());
        info!(
            total = summary.total,
            enriched = summary.enriched,
            needs_review = summary.needs_review,
            "Enrichment finished"
        );
        Ok(summary)
    }
}

/// Merges one outcome into its record and the run counters.
///
/// Fields left by an earlier run are replaced or removed so a record never
/// carries a `reference_error` next to a fresh match, nor stale
/// `references_structured` under `needs_review`.
pub fn apply_outcome(record: &mut Record, outcome: RecordOutcome, summary: &mut RunSummary) {
    match outcome {
        RecordOutcome::Success(resolution) => {
            if resolution.status == MatchStatus::Unchanged {
                return;
            }
            let structured = match serde_json::to_value(&resolution.structured) {
                Ok(v) => v,
                Err(e) => {
                    return apply_outcome(record, RecordOutcome::Failure(e.to_string()), summary);
                }
            };
            record.shift_remove("reference_error");
            record.insert("references".into(), Value::Array(resolution.references));
            record.insert("references_structured".into(), structured);
            record.insert(
                "reference_match_status".into(),
                Value::String(resolution.status.as_str().into()),
            );
            summary.enriched += 1;
            if resolution.status == MatchStatus::NeedsReview {
                summary.needs_review += 1;
            }
        }
        RecordOutcome::Failure(error) => {
            record.insert(
                "reference_match_status".into(),
                Value::String(MatchStatus::NeedsReview.as_str().into()),
            );
            record.insert("reference_error".into(), Value::String(error));
            record.insert("references_structured".into(), Value::Array(Vec::new()));
            summary.needs_review += 1;
        }
    }
}

/// Sets `generated_at` (UTC) and appends the provenance note.
pub fn stamp_document(document: &mut Value, now: DateTime<Utc>) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let note = compose_note(root.get("note").and_then(Value::as_str).unwrap_or(""));
    root.insert(
        "generated_at".into(),
        Value::String(now.format(GENERATED_AT_FORMAT).to_string()),
    );
    root.insert("note".into(), Value::String(note));
}

/// `existing | provenance` with stray separators trimmed from both ends.
pub fn compose_note(existing: &str) -> String {
    format!("{} | {}", existing, PROVENANCE_NOTE)
        .trim_matches(|c| c == ' ' || c == '|')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverSettings;
    use crate::testing::{ids, FakeSource};
    use chrono::TimeZone;
    use serde_json::json;

    fn enricher(source: FakeSource) -> Enricher<FakeSource> {
        Enricher::new(EvidenceResolver::new(source, ResolverSettings::default()), Duration::ZERO)
    }

    #[test]
    fn test_compose_note() {
        assert_eq!(compose_note(""), PROVENANCE_NOTE);
        assert_eq!(compose_note("Seed v2"), format!("Seed v2 | {}", PROVENANCE_NOTE));
        assert_eq!(compose_note(" | Seed | "), format!("Seed |  | {}", PROVENANCE_NOTE));
    }

    #[test]
    fn test_stamp_document() {
        let mut doc = json!({ "protocols": [], "note": 42 });
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        stamp_document(&mut doc, now);
        assert_eq!(doc["generated_at"], json!("2026-01-02T03:04:05"));
        assert_eq!(doc["note"], json!(PROVENANCE_NOTE));
    }

    #[test]
    fn test_failure_outcome_sets_error_only() {
        let mut record = json!({ "title": "T", "references": ["PubMed search: x"] })
            .as_object()
            .cloned()
            .unwrap();
        let mut summary = RunSummary::default();
        apply_outcome(&mut record, RecordOutcome::Failure("timed out".into()), &mut summary);

        assert_eq!(record["reference_match_status"], json!("needs_review"));
        assert_eq!(record["reference_error"], json!("timed out"));
        assert_eq!(record["references"], json!(["PubMed search: x"]));
        assert_eq!(record["references_structured"], json!([]));
        assert_eq!(summary, RunSummary { total: 0, enriched: 0, needs_review: 1 });
    }

    #[tokio::test]
    async fn test_unchanged_records_are_untouched() {
        let original = json!({ "title": "Journaling", "goal": "Clarity", "references": ["Pennebaker 1997"], "extra": { "k": [1, 2] } });
        let mut doc = json!({ "protocols": [original.clone()] });

        let summary = enricher(FakeSource::default()).run(&mut doc).await.unwrap();
        assert_eq!(doc["protocols"][0], original);
        assert_eq!(
            serde_json::to_string(&doc["protocols"][0]).unwrap(),
            serde_json::to_string(&original).unwrap()
        );
        assert_eq!(summary, RunSummary { total: 1, enriched: 0, needs_review: 0 });
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_record() {
        let source = FakeSource::with_searches(vec![
            ids(&["1"]),
            Err(anyhow::anyhow!("HTTP 500")),
            ids(&["3"]),
        ])
        .summary("1", "One", "J", "2020")
        .summary("3", "Three", "J", "2021");
        let mut doc = json!({
            "protocols": [
                { "title": "A", "goal": "a", "references": ["PubMed search: a"] },
                { "title": "B", "goal": "b", "references": ["PubMed search: b"] },
                { "title": "C", "goal": "c", "references": ["PubMed search: c"] }
            ]
        });

        let summary = enricher(source).run(&mut doc).await.unwrap();
        let p = &doc["protocols"];
        assert_eq!(p[0]["reference_match_status"], json!("auto_matched"));
        assert_eq!(p[1]["reference_match_status"], json!("needs_review"));
        assert!(p[1]["reference_error"].as_str().unwrap().contains("HTTP 500"));
        assert_eq!(p[2]["reference_match_status"], json!("auto_matched"));
        assert_eq!(p[2]["references_structured"][0]["pmid"], json!("3"));
        assert!(p[0].get("reference_error").is_none());
        assert_eq!(summary, RunSummary { total: 3, enriched: 2, needs_review: 1 });
    }

    #[tokio::test]
    async fn test_rerun_clears_fields_from_previous_run() {
        let source = FakeSource::with_searches(vec![
            ids(&["1"]),
            Err(anyhow::anyhow!("operation timed out")),
        ])
        .summary("1", "One", "J", "2020");
        let mut doc = json!({
            "protocols": [
                {
                    "title": "A", "goal": "a",
                    "references": ["PubMed search: a"],
                    "reference_match_status": "needs_review",
                    "reference_error": "operation timed out"
                },
                {
                    "title": "B", "goal": "b",
                    "references": ["PubMed search: b"],
                    "references_structured": [{ "pmid": "9", "doi": null, "title": "Old", "journal": "J", "pubdate": "2019", "url": "https://pubmed.ncbi.nlm.nih.gov/9/" }],
                    "reference_match_status": "auto_matched"
                }
            ]
        });

        let summary = enricher(source).run(&mut doc).await.unwrap();
        let p = &doc["protocols"];
        assert_eq!(p[0]["reference_match_status"], json!("auto_matched"));
        assert!(p[0].get("reference_error").is_none());
        assert_eq!(p[0]["references_structured"][0]["pmid"], json!("1"));
        assert_eq!(p[1]["reference_match_status"], json!("needs_review"));
        assert!(p[1]["reference_error"].as_str().unwrap().contains("operation timed out"));
        assert_eq!(p[1]["references_structured"], json!([]));
        assert_eq!(summary, RunSummary { total: 2, enriched: 1, needs_review: 1 });
    }

    #[tokio::test]
    async fn test_empty_results_need_review_without_error() {
        let mut doc = json!({
            "protocols": [{ "title": "A", "goal": "a", "references": ["PubMed search: nothing"] }]
        });

        let summary = enricher(FakeSource::default()).run(&mut doc).await.unwrap();
        let record = &doc["protocols"][0];
        assert_eq!(record["reference_match_status"], json!("needs_review"));
        assert_eq!(record["references"], json!(["PubMed search: nothing"]));
        assert_eq!(record["references_structured"], json!([]));
        assert!(record.get("reference_error").is_none());
        assert_eq!(summary, RunSummary { total: 1, enriched: 1, needs_review: 1 });
    }

    #[tokio::test]
    async fn test_non_object_entries_are_counted_and_skipped() {
        let mut doc = json!({ "protocols": ["stray", 3] });
        let mut progress = Vec::new();

        let summary = enricher(FakeSource::default())
            .run_with_progress(&mut doc, |done, total| progress.push((done, total)))
            .await
            .unwrap();
        assert_eq!(doc["protocols"], json!(["stray", 3]));
        assert_eq!(summary.total, 2);
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_invalid_document_aborts_before_processing() {
        let source = FakeSource::default();
        let enricher = enricher(source);
        let mut doc = json!({ "protocols": "not a list" });

        assert!(enricher.run(&mut doc).await.is_err());
        assert!(doc.get("generated_at").is_none());
        assert_eq!(enricher.resolver().source().query_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_follows_every_record() {
        let enricher = Enricher::new(
            EvidenceResolver::new(FakeSource::default(), ResolverSettings::default()),
            Duration::from_secs(1),
        );
        let mut doc = json!({ "protocols": [{}, {}, {}] });

        let start = tokio::time::Instant::now();
        enricher.run(&mut doc).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }
}
