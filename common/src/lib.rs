/*!
common/src/lib.rs

Shared configuration types and the article record for Clusterscope.

This file provides:
- The `Article` record produced by feed ingestion and consumed by every later stage
- Config data structures (deserialized from TOML)
- An async loader that merges a default config file with an optional override
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Title used when a feed entry carries none.
pub const NO_TITLE: &str = "No Title Available";
/// Link used when a feed entry carries none.
pub const NO_LINK: &str = "#";
/// Summary used when neither summary, description nor content yields any text.
pub const NO_SUMMARY: &str = "No Summary Available";

/// A single feed entry after field resolution. All three fields are always filled,
/// either from the feed or with the sentinels above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// Feed fetching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    /// Reject feed bodies larger than this many bytes
    pub max_response_bytes: Option<u64>,
}

/// TF-IDF vectorizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Drop terms that appear in fewer documents than this
    pub min_df: Option<usize>,
    /// Words removed in addition to the built-in English list
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
}

/// K-means configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub num_clusters: Option<usize>,
    pub max_iterations: Option<u64>,
    pub tolerance: Option<f64>,
    pub n_runs: Option<usize>,
    pub seed: Option<u64>,
}

/// Pipeline behaviour switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Treat transport/parse failures as an empty feed instead of an error
    pub collapse_fetch_errors: Option<bool>,
}

/// HTTP front end configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// URL pre-filled in the form
    pub default_url: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl FetchConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(10)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("Clusterscope/0.1.0")
    }
}

impl VectorizerConfig {
    pub fn min_df(&self) -> usize {
        self.min_df.unwrap_or(1).max(1)
    }
}

impl ClusteringConfig {
    pub fn num_clusters(&self) -> usize {
        self.num_clusters.unwrap_or(5)
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations.unwrap_or(300)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(1e-4)
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs.unwrap_or(10).max(1)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }
}

impl PipelineConfig {
    pub fn collapse_fetch_errors(&self) -> bool {
        self.collapse_fetch_errors.unwrap_or(false)
    }
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8000)
    }

    pub fn default_url(&self) -> &str {
        self.default_url
            .as_deref()
            .unwrap_or("https://example-news-website.com")
    }
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped; with neither present every default applies.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
