//! Scripted [`EvidenceSource`] for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::models::DocumentSummary;
use crate::sources::EvidenceSource;

#[derive(Default)]
pub(crate) struct FakeSource {
    searches: Mutex<VecDeque<anyhow::Result<Vec<String>>>>,
    summaries: HashMap<String, DocumentSummary>,
    pub queries: Mutex<Vec<String>>,
    pub fetches: Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
    /// Each search call pops the next scripted answer; an exhausted script returns no ids.
    pub fn with_searches(searches: Vec<anyhow::Result<Vec<String>>>) -> Self {
        Self { searches: Mutex::new(searches.into()), ..Default::default() }
    }

    pub fn summary(mut self, pmid: &str, title: &str, source: &str, pubdate: &str) -> Self {
        self.summaries.insert(pmid.to_string(), DocumentSummary {
            title: Some(title.to_string()),
            source: Some(source.to_string()),
            pubdate: Some(pubdate.to_string()),
            elocationid: None,
        });
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

pub(crate) fn ids(list: &[&str]) -> anyhow::Result<Vec<String>> {
    Ok(list.iter().map(|s| s.to_string()).collect())
}

#[async_trait]
impl EvidenceSource for FakeSource {
    async fn search_ids(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.searches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_summaries(
        &self,
        ids: &[String],
    ) -> anyhow::Result<HashMap<String, DocumentSummary>> {
        self.fetches.lock().unwrap().push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| self.summaries.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }
}
