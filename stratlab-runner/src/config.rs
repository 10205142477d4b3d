//! Layered pipeline configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `stratlab.toml` in the working directory, or an explicit `--config` file
//! 3. Environment variables (`STRATLAB_*`, `__` separates nested sections)
//!
//! `STRATLAB_STORAGE__DIR=/tmp/x` maps to `storage.dir`,
//! `STRATLAB_LIMITS__MIN_PROMPT_LEN=5` to `limits.min_prompt_len`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::catalog::{Catalog, CatalogBuilder, CatalogError};
use stratlab_core::domain::{AssetKind, ParseKindError, RiskLevel, StrategyKind};

pub const DEFAULT_CONFIG_FILE: &str = "stratlab.toml";
pub const ENV_PREFIX: &str = "STRATLAB_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid pattern configuration: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSONL history files.
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("data"), enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Prompts shorter than this (in characters) produce a warning.
    pub min_prompt_len: usize,
    /// Prompts longer than this (in characters) produce a warning.
    pub max_prompt_len: usize,
    /// Prompts with fewer whitespace-separated words produce a warning.
    pub min_prompt_words: usize,
    /// Records below this confidence produce a warning.
    pub warn_confidence_below: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_prompt_len: 10,
            max_prompt_len: 10_000,
            min_prompt_words: 3,
            warn_confidence_below: 0.5,
        }
    }
}

/// Extra matching rules keyed by wire name (`staking`, `NEAR`, `high`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default)]
    pub strategy: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub asset: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub risk: BTreeMap<String, Vec<String>>,
}

impl PatternsConfig {
    pub fn is_empty(&self) -> bool {
        self.strategy.is_empty() && self.asset.is_empty() && self.risk.is_empty()
    }
}

// ─── Root ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    /// Extra or overriding term substitutions, generic → specific.
    #[serde(default)]
    pub terms: BTreeMap<String, String>,
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue { field: field.into(), reason: reason.into() }
}

fn parse_key<K: FromStr<Err = ParseKindError>>(section: &str, name: &str) -> Result<K, ConfigError> {
    name.parse()
        .map_err(|e: ParseKindError| invalid(format!("patterns.{section}.{name}"), e.to_string()))
}

impl PipelineConfig {
    /// Build the provider chain. `path` replaces the default `stratlab.toml`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate from all sources. Does not read `.env`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(invalid("config", format!("file {} does not exist", path.display())));
            }
        }
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the working directory first, then [`Self::load`].
    pub fn load_with_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.min_prompt_len > limits.max_prompt_len {
            return Err(invalid(
                "limits.min_prompt_len",
                format!(
                    "{} exceeds limits.max_prompt_len ({})",
                    limits.min_prompt_len, limits.max_prompt_len
                ),
            ));
        }
        if !(0.0..=1.0).contains(&limits.warn_confidence_below) {
            return Err(invalid("limits.warn_confidence_below", "must lie in [0.0, 1.0]"));
        }
        Ok(())
    }

    /// Built-in catalog extended with the configured patterns and terms.
    ///
    /// Returns the shared built-in catalog when nothing is configured.
    pub fn catalog(&self) -> Result<Arc<Catalog>, ConfigError> {
        if self.patterns.is_empty() && self.terms.is_empty() {
            return Ok(Catalog::builtin());
        }

        let mut builder = CatalogBuilder::default();
        for (name, patterns) in &self.patterns.strategy {
            let kind: StrategyKind = parse_key("strategy", name)?;
            builder = builder.strategy_patterns(kind, patterns.iter().cloned());
        }
        for (name, patterns) in &self.patterns.asset {
            let kind: AssetKind = parse_key("asset", name)?;
            builder = builder.asset_patterns(kind, patterns.iter().cloned());
        }
        for (name, patterns) in &self.patterns.risk {
            let kind: RiskLevel = parse_key("risk", name)?;
            builder = builder.risk_patterns(kind, patterns.iter().cloned());
        }
        for (generic, specific) in &self.terms {
            builder = builder.term(generic.clone(), specific.clone());
        }

        Ok(Arc::new(builder.build()?))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let body = self.to_toml()?;
        let write_err = |source| ConfigError::Write { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, body).map_err(write_err)
    }
}
