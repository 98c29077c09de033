//! PubMed E-utilities client.
//!
//! Endpoints used:
//!   esearch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   esummary: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use labref_common::SandboxClient as Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use super::EvidenceSource;
use crate::models::DocumentSummary;

const ESEARCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

pub struct PubMedClient {
    client: Client,
    api_key: Option<SecretString>,
}

impl PubMedClient {
    pub fn new(api_key: Option<SecretString>) -> labref_common::Result<Self> {
        Ok(Self::with_client(Client::new()?, api_key))
    }

    pub fn with_client(client: Client, api_key: Option<SecretString>) -> Self {
        Self { client, api_key }
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.expose_secret().to_string()));
        }
        params
    }

    async fn get_json(&self, url: &str, params: &[(&'static str, String)]) -> anyhow::Result<Value> {
        let resp = self.client
            .get(url)?
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        let body = resp.json::<Value>().await.context("PubMed returned a non-JSON body")?;
        Ok(body)
    }

    /// Search PubMed and return PMIDs in relevance order.
    #[instrument(skip(self))]
    async fn esearch(&self, term: &str, max: usize) -> anyhow::Result<Vec<String>> {
        let mut params = self.base_params();
        params.push(("term", term.to_string()));
        params.push(("retmax", max.to_string()));
        params.push(("sort", "relevance".to_string()));

        let resp = self.get_json(ESEARCH_URL, &params).await?;
        let ids = parse_esearch(&resp)?;
        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch document summaries for a batch of PMIDs.
    #[instrument(skip(self))]
    async fn esummary(&self, pmids: &[String]) -> anyhow::Result<HashMap<String, DocumentSummary>> {
        if pmids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut params = self.base_params();
        params.push(("id", pmids.join(",")));

        let resp = self.get_json(ESUMMARY_URL, &params).await?;
        let summaries = parse_esummary(&resp)?;
        if summaries.len() < pmids.len() {
            debug!(requested = pmids.len(), returned = summaries.len(), "Some PMIDs had no summary");
        }
        Ok(summaries)
    }
}

#[async_trait]
impl EvidenceSource for PubMedClient {
    async fn search_ids(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<String>> {
        self.esearch(query, max_results).await
    }

    async fn fetch_summaries(
        &self,
        ids: &[String],
    ) -> anyhow::Result<HashMap<String, DocumentSummary>> {
        self.esummary(ids).await
    }
}

/// Extract the id list from an esearch JSON response.
///
/// A missing `esearchresult` object or an `ERROR` entry is a malformed
/// response; a missing `idlist` means no hits.
fn parse_esearch(resp: &Value) -> anyhow::Result<Vec<String>> {
    let result = resp
        .get("esearchresult")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow!("malformed esearch response: no 'esearchresult' object"))?;

    if let Some(err) = result.get("ERROR").and_then(Value::as_str) {
        bail!("esearch error: {}", err);
    }

    let ids = result
        .get("idlist")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Ok(ids)
}

/// Extract per-PMID summaries from an esummary JSON response.
///
/// The `result` object maps each PMID to its summary plus a `uids` list;
/// entries flagged with `error` (unknown or withdrawn PMIDs) are dropped.
fn parse_esummary(resp: &Value) -> anyhow::Result<HashMap<String, DocumentSummary>> {
    if let Some(err) = resp.get("error").and_then(Value::as_str) {
        bail!("esummary error: {}", err);
    }

    let result = resp
        .get("result")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow!("malformed esummary response: no 'result' object"))?;

    let text = |item: &Value, key: &str| item.get(key).and_then(Value::as_str).map(String::from);

    let mut summaries = HashMap::new();
    for (pmid, item) in result {
        if pmid == "uids" || !item.is_object() {
            continue;
        }
        if let Some(err) = item.get("error") {
            warn!(%pmid, %err, "Skipping PMID without summary");
            continue;
        }
        summaries.insert(pmid.clone(), DocumentSummary {
            title:       text(item, "title"),
            source:      text(item, "source"),
            pubdate:     text(item, "pubdate"),
            elocationid: text(item, "elocationid"),
        });
    }
    Ok(summaries)
}
