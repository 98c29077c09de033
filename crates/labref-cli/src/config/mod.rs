//! Configuration loading for labref.
//! Reads labref.toml from the path given on the command line, the path in the
//! LABREF_CONFIG env var, or the current directory. The file is optional.

use labref_common::LabrefError;
use labref_enrich::enricher::DEFAULT_DELAY;
use labref_enrich::ResolverSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub pubmed: PubMedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_max_per_protocol")]
    pub max_per_protocol: usize,
    /// Prefer papers from the last N years; 0 disables the date filter.
    #[serde(default = "default_prefer_years")]
    pub prefer_years: u32,
    /// Pause after each protocol, in seconds.
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: f64,
}

fn default_max_per_protocol() -> usize { 3 }
fn default_prefer_years()     -> u32   { 10 }
fn default_sleep_secs()       -> f64   { DEFAULT_DELAY.as_secs_f64() }

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_per_protocol: default_max_per_protocol(),
            prefer_years:     default_prefer_years(),
            sleep_secs:       default_sleep_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// NCBI API key; NCBI_API_KEY or --api-key take precedence.
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 20 }

impl Default for PubMedConfig {
    fn default() -> Self {
        Self { api_key: None, timeout_secs: default_timeout_secs() }
    }
}


impl Config {
    /// Load configuration.
    /// An explicit path must exist; the implicit locations fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => (
                std::env::var("LABREF_CONFIG")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("labref.toml")),
                false,
            ),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LabrefError> {
        let sleep = self.enrichment.sleep_secs;
        if let Err(e) = Duration::try_from_secs_f64(sleep) {
            return Err(LabrefError::Config(format!(
                "enrichment.sleep_secs must be a non-negative, representable number of seconds, got {}: {}",
                sleep, e
            )));
        }
        if self.pubmed.timeout_secs == 0 {
            return Err(LabrefError::Config("pubmed.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            max_results:   self.enrichment.max_per_protocol,
            recency_years: self.enrichment.prefer_years,
        }
    }

    /// Falls back to [`DEFAULT_DELAY`] if `sleep_secs` was never validated.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.enrichment.sleep_secs).unwrap_or(DEFAULT_DELAY)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.pubmed.timeout_secs)
    }
}
