//! perfprof.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilerConfig {
    pub server: Option<ServerConfig>,
    pub engine: Option<EngineConfig>,
    pub datasource: Option<DataSourceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of pairs fetched concurrently.
    pub concurrency: Option<usize>,
    /// Upper bound on a whole profile run, e.g. "30s" or "2m".
    pub deadline: Option<String>,
}

/// Backing store for benchmarking measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSourceConfig {
    /// Built-in demonstration fixture.
    Mock,
    /// CSV file on the local filesystem.
    File { path: PathBuf },
    /// CSV object in S3-compatible object storage.
    S3 {
        bucket: String,
        key: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
}

impl ProfilerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProfilerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would only fail later at startup.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(engine) = &self.engine {
            if engine.concurrency == Some(0) {
                anyhow::bail!("engine.concurrency must be at least 1");
            }
            engine.deadline()?;
        }
        match &self.datasource {
            Some(DataSourceConfig::File { path }) if path.as_os_str().is_empty() => {
                anyhow::bail!("datasource.path must not be empty");
            }
            Some(DataSourceConfig::S3 { bucket, key, .. }) if bucket.is_empty() || key.is_empty() => {
                anyhow::bail!("datasource.bucket and datasource.key must be provided");
            }
            _ => Ok(()),
        }
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or("0.0.0.0")
    }

    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }
}

impl EngineConfig {
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1)
    }

    pub fn deadline(&self) -> anyhow::Result<Option<Duration>> {
        self.deadline.as_deref().map(parse_duration).transpose()
    }
}

/// Parse a duration string like "500ms", "30s", "5m".
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins = mins
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("invalid duration '{s}': {e}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow::anyhow!("invalid duration '{s}': too large"))?;
        Ok(Duration::from_secs(secs))
    } else {
        s.parse::<u64>().map(Duration::from_secs)
    };
    parsed.map_err(|e| anyhow::anyhow!("invalid duration '{s}': {e}"))
}
