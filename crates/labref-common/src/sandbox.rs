use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::LabrefError;

/// Request timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// An HTTP client that only allows requests to approved domains.
///
/// Every outbound call of the enricher goes through this type, so a typo in
/// an endpoint constant fails loudly instead of reaching an arbitrary host.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, LabrefError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with the default allowlist and a fixed per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, LabrefError> {
        let mut allowlist = HashSet::new();
        let domains = [
            "eutils.ncbi.nlm.nih.gov", // PubMed E-utilities
            "pubmed.ncbi.nlm.nih.gov", // PubMed article pages
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("labref/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LabrefError::Config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(?timeout, "HTTP client ready");
        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Builds a GET request, refusing hosts outside the allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, LabrefError> {
        if !self.is_allowed(url) {
            return Err(LabrefError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}
