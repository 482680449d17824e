use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SourceConfig;
use crate::errors::IngestResult;

pub const DEFAULT_HOURS_BACK: u32 = 24;

fn default_hours_back() -> u32 {
    DEFAULT_HOURS_BACK
}

fn default_cache_enabled() -> bool {
    true
}

/// Effective run configuration: which sources to ingest and how far back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_hours_back")]
    pub hours_back: u32,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            hours_back: DEFAULT_HOURS_BACK,
            cache_enabled: true,
            sources: Vec::new(),
        }
    }
}

impl IngestConfig {
    pub fn new(sources: Vec<SourceConfig>, hours_back: u32) -> Self {
        Self {
            hours_back,
            sources,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> IngestResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a sources file. A missing file means nothing is configured.
    pub fn load<P: AsRef<Path>>(path: P) -> IngestResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "sources file not found, no sources configured");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from a higher-precedence layer (env or CLI).
    pub fn with_overrides(mut self, hours_back: Option<u32>, cache_enabled: Option<bool>) -> Self {
        if let Some(hours_back) = hours_back {
            self.hours_back = hours_back;
        }
        if let Some(cache_enabled) = cache_enabled {
            self.cache_enabled = cache_enabled;
        }
        self
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}
