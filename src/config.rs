//! Harvest configuration.
//!
//! Settings come from an optional YAML file; every field has a default so a
//! partial file is valid.
//!
//! ```yaml
//! base_url: https://fbref.com/en/comps/
//! user_agent: Mozilla/5.0 (X11; Linux x86_64)
//! timeout_secs: 30
//! max_retries: 0
//! base_delay_ms: 1000
//! concurrency: 3
//! ```

use crate::catalog::DEFAULT_BASE_URL;
use crate::errors::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Root of the competition pages.
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout; an expired request fails its category.
    pub timeout_secs: u64,
    /// Extra attempts per fetch. Zero means a single fetch.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    /// Category fetches allowed in flight at once.
    pub concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_retries: 0,
            base_delay_ms: 1000,
            concurrency: 3,
        }
    }
}

impl HarvestConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Arguments
    ///
    /// * `text` - YAML holding any subset of the settings; absent fields take
    ///   their defaults.
    ///
    /// # Returns
    ///
    /// The validated settings, or the first YAML or validation error.
    pub fn from_yaml(text: &str) -> Result<Self, HarvestError> {
        let config: HarvestConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml(&text)?;
        info!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.concurrency == 0 {
            return Err(HarvestError::Config("concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(HarvestError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
