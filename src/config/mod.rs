pub mod sources;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{IngestError, IngestResult};
use crate::services::ServiceOptions;
use crate::sources::AdapterOptions;

pub use sources::IngestConfig;

const DEFAULT_MAX_CONCURRENCY: usize = 8;
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Process-level settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub sources_path: PathBuf,
    pub cache_dir: PathBuf,
    /// `USE_CACHE`; unset leaves the sources file in charge
    pub use_cache: Option<bool>,
    pub hours_back: Option<u32>,
    pub max_concurrency: usize,
    /// None disables the run deadline
    pub run_timeout: Option<Duration>,
    pub http_timeout: Duration,
    pub adapters: AdapterOptions,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> IngestResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> IngestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let sources_path = var("INGEST_SOURCES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_sources_path);

        let cache_dir = var("INGEST_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".cache"));

        let use_cache = var("USE_CACHE").map(|v| matches!(v.trim(), "1" | "true"));

        let hours_back = parse_var(&var, "INGEST_HOURS_BACK")?;

        let max_concurrency = parse_var(&var, "INGEST_MAX_CONCURRENCY")?
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .max(1);

        let run_timeout = match parse_var::<u64, _>(&var, "INGEST_RUN_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS)),
        };

        let http_timeout = Duration::from_secs(
            parse_var(&var, "INGEST_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let mut adapters = AdapterOptions::default();
        if let Some(base_url) = var("INGEST_YOUTUBE_BASE_URL") {
            adapters.youtube_base_url = base_url;
        }
        if let Some(languages) = var("INGEST_TRANSCRIPT_LANGS") {
            adapters.transcript_languages = languages
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
        }

        Ok(Self {
            sources_path,
            cache_dir,
            use_cache,
            hours_back,
            max_concurrency,
            run_timeout,
            http_timeout,
            adapters,
        })
    }

    // Default sources file is relative to executable directory
    fn default_sources_path() -> PathBuf {
        Self::exe_dir()
            .map(|d| d.join("sources.toml"))
            .filter(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from("sources.toml"))
    }

    /// Sources file with env overrides applied.
    pub fn load_sources(&self) -> IngestResult<IngestConfig> {
        Ok(IngestConfig::load(&self.sources_path)?.with_overrides(self.hours_back, self.use_cache))
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            max_concurrency: self.max_concurrency,
            run_timeout: self.run_timeout,
        }
    }
}

fn parse_var<T, F>(var: &F, name: &str) -> IngestResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                IngestError::Config(format!("{} must be a non-negative integer, got '{}'", name, raw))
            })
        })
        .transpose()
}
