//! # Configuration
//!
//! TOML-backed run configuration.
//!
//! Resolution order, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `--config <path>`, or `citerank.toml` in the working directory if present
//! 3. Environment (`CITERANK_DAMPING`, `CITERANK_MAX_ITERATIONS`, `CITERANK_DB`)
//! 4. CLI flags, applied by the command that owns them

use citerank_core::{CiteRankError, RankConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "citerank.toml";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// Full run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CiteRankConfig {
    pub rank: RankConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

/// Record sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Paper metadata CSV.
    pub metadata: PathBuf,
    /// Citation edges, one JSON object per line.
    pub citations: PathBuf,
    /// Optional paper details CSV stored next to the ranking.
    pub details: Option<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            metadata: PathBuf::from("data/paper_metadata.csv"),
            citations: PathBuf::from("data/citations.jsonl"),
            details: None,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// DOT file of the graph before ranking.
    pub dot: PathBuf,
    /// DOT file of the graph with scores.
    pub ranked_dot: PathBuf,
    /// Binary graph snapshot.
    pub snapshot: PathBuf,
    /// redb rank database.
    pub database: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dot: PathBuf::from("citation_network.dot"),
            ranked_dot: PathBuf::from("citation_network_with_pagerank.dot"),
            snapshot: PathBuf::from("citerank.snapshot"),
            database: PathBuf::from("citerank.redb"),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl CiteRankConfig {
    /// Parse a config document.
    pub fn from_toml(text: &str) -> Result<Self, CiteRankError> {
        toml::from_str(text).map_err(|e| CiteRankError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, CiteRankError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            CiteRankError::ConfigError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CiteRankError::ConfigError(format!(
                "Config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `citerank.toml` is used when
    /// present and the defaults otherwise. Environment overrides are applied
    /// last and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, CiteRankError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CITERANK_*` overrides from a key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CiteRankError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CITERANK_DAMPING") {
            self.rank.damping = parse_env("CITERANK_DAMPING", &value)?;
        }
        if let Some(value) = lookup("CITERANK_MAX_ITERATIONS") {
            self.rank.max_iterations = parse_env("CITERANK_MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = lookup("CITERANK_DB") {
            self.output.database = PathBuf::from(value);
        }
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), CiteRankError> {
        self.rank.validate()?;
        if self.server.host.is_empty() {
            return Err(CiteRankError::ConfigError("server.host must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CiteRankError> {
    value
        .trim()
        .parse()
        .map_err(|_| CiteRankError::ConfigError(format!("{} has invalid value '{}'", key, value)))
}

// =============================================================================
// TESTS
// =============================================================================
