//! Literature source clients.

pub mod pubmed;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::DocumentSummary;

/// The two operations the resolver needs from a literature service.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Relevance-ranked identifiers matching `query`, at most `max_results`.
    async fn search_ids(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<String>>;

    /// Summaries for `ids` in one batch. Unknown or withdrawn ids are simply absent.
    async fn fetch_summaries(
        &self,
        ids: &[String],
    ) -> anyhow::Result<HashMap<String, DocumentSummary>>;
}
