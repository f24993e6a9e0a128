//! Configuration system for arbor.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{ArborError, ArborResult};

/// Default cap on the number of clauses one trigger may expand into.
pub const DEFAULT_MAX_CLAUSES: usize = 4096;

/// Which satisfied triggers `matches` reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Only the deepest matching node on each path reports its triggers.
    #[default]
    MostSpecific,
    /// Every matching node reports, including ancestors of deeper matches.
    Exhaustive,
}

/// Trigger tree configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerTreeConfig {
    /// Which satisfied triggers are returned from a match.
    pub match_mode: MatchMode,
    /// Maximum number of clauses a single trigger may normalize into.
    pub max_clauses: usize,
    /// Log predicate evaluation errors at debug instead of trace.
    pub log_evaluation_errors: bool,
}

impl Default for TriggerTreeConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::MostSpecific,
            max_clauses: DEFAULT_MAX_CLAUSES,
            log_evaluation_errors: false,
        }
    }
}

impl TriggerTreeConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ArborResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ArborError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ArborError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ArborError::Configuration(e.to_string()))?,
            _ => {
                return Err(ArborError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(mode) = lookup("ARBOR_MATCH_MODE") {
            if let Ok(mode) = mode.trim().parse() {
                config.match_mode = mode;
            }
        }
        if let Some(max) = lookup("ARBOR_MAX_CLAUSES") {
            match max.trim().parse::<usize>() {
                Ok(max) if max > 0 => config.max_clauses = max,
                _ => {}
            }
        }
        if let Some(flag) = lookup("ARBOR_LOG_EVALUATION_ERRORS") {
            config.log_evaluation_errors =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        config
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> ArborResult<()> {
        if self.max_clauses == 0 {
            return Err(ArborError::Configuration(
                "max_clauses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> TriggerTreeConfigBuilder {
        TriggerTreeConfigBuilder::default()
    }
}

/// Builder for TriggerTreeConfig.
#[derive(Default)]
pub struct TriggerTreeConfigBuilder {
    config: TriggerTreeConfig,
}

impl TriggerTreeConfigBuilder {
    /// Set the match mode.
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.config.match_mode = mode;
        self
    }

    /// Set the per-trigger clause limit.
    pub fn max_clauses(mut self, max: usize) -> Self {
        self.config.max_clauses = max;
        self
    }

    /// Log evaluation errors at debug level.
    pub fn log_evaluation_errors(mut self, enabled: bool) -> Self {
        self.config.log_evaluation_errors = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TriggerTreeConfig {
        self.config
    }
}
