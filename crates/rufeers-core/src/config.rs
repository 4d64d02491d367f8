//! RUFEERS Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with defaults that reproduce the stock extraction heuristic.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tree::{CyclePolicy, TraversalLimits};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Relationship extraction settings
    pub extraction: ExtractionConfig,

    /// Sentiment classification settings
    pub sentiment: SentimentConfig,

    /// Related news search settings
    pub news: NewsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay every variable `lookup` returns a value for
    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Extraction
        if let Some(label) = lookup("RUFEERS_PERSON_LABEL") {
            self.extraction.person_label = label;
        }
        if let Some(labels) = lookup("RUFEERS_LOCATION_LABELS") {
            self.extraction.location_labels = split_list(&labels);
        }
        if let Some(depth) = lookup("RUFEERS_MAX_DEPTH") {
            self.extraction.max_depth = depth.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RUFEERS_MAX_DEPTH".to_string(),
                value: depth,
            })?;
        }
        if let Some(policy) = lookup("RUFEERS_ON_CYCLE") {
            self.extraction.on_cycle = policy.parse()?;
        }

        // News
        if let Some(url) = lookup("RUFEERS_NEWS_URL") {
            self.news.base_url = url;
        }
        if let Some(timeout) = lookup("RUFEERS_NEWS_TIMEOUT") {
            self.news.timeout_secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RUFEERS_NEWS_TIMEOUT".to_string(),
                value: timeout,
            })?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        let config = self.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the extractor cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.person_label.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "extraction.person_label".to_string(),
            ));
        }
        if self.extraction.location_labels.is_empty() {
            return Err(ConfigError::MissingRequired(
                "extraction.location_labels".to_string(),
            ));
        }
        if self.extraction.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.max_depth".to_string(),
                value: "0".to_string(),
            });
        }
        if self.news.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "news.timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Relationship extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Entity label that marks a person
    pub person_label: String,

    /// Token entity labels accepted as a location
    pub location_labels: Vec<String>,

    /// Deepest descent below an action token
    pub max_depth: usize,

    /// Behaviour when a token is reached twice
    pub on_cycle: CyclePolicy,
}

impl ExtractionConfig {
    pub fn limits(&self) -> TraversalLimits {
        TraversalLimits::new(self.max_depth, self.on_cycle)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            person_label: "PERSON".to_string(),
            location_labels: vec!["LOC".to_string()],
            max_depth: TraversalLimits::DEFAULT_MAX_DEPTH,
            on_cycle: CyclePolicy::Skip,
        }
    }
}

/// Sentiment classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SentimentConfig {
    /// Scores with an absolute value at or below this are neutral
    pub neutral_threshold: f32,
}

/// Related news search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Search page URL; the query is sent as the `q` parameter
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum headlines returned per search
    pub max_headlines: usize,

    /// User-Agent header sent with requests
    pub user_agent: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com/search".to_string(),
            timeout_secs: 15,
            max_headlines: 20,
            user_agent: concat!("rufeers/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.person_label, "PERSON");
        assert_eq!(config.extraction.location_labels, vec!["LOC".to_string()]);
        assert_eq!(config.extraction.on_cycle, CyclePolicy::Skip);
        assert_eq!(config.news.max_headlines, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [extraction]
            location_labels = ["LOC", "GPE"]
            on_cycle = "error"

            [logging]
            json_format = true
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.person_label, "PERSON");
        assert_eq!(config.extraction.location_labels.len(), 2);
        assert_eq!(config.extraction.on_cycle, CyclePolicy::Error);
        assert_eq!(config.extraction.max_depth, TraversalLimits::DEFAULT_MAX_DEPTH);
        assert!(config.logging.json_format);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_empty_labels() {
        let mut config = AppConfig::default();
        config.extraction.location_labels.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_limits_from_config() {
        let mut config = ExtractionConfig::default();
        config.max_depth = 8;
        config.on_cycle = CyclePolicy::Error;

        assert_eq!(config.limits(), TraversalLimits::new(8, CyclePolicy::Error));
    }

    fn overrides(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides_restore_default_values() {
        let file: AppConfig = toml::from_str(
            r#"
            [extraction]
            location_labels = ["GPE"]
            on_cycle = "error"
            "#,
        )
        .unwrap();

        let config = file
            .apply_overrides(overrides(&[
                ("RUFEERS_ON_CYCLE", "skip"),
                ("RUFEERS_LOCATION_LABELS", "LOC"),
            ]))
            .unwrap();

        assert_eq!(config.extraction.on_cycle, CyclePolicy::Skip);
        assert_eq!(config.extraction.location_labels, vec!["LOC".to_string()]);
    }

    #[test]
    fn test_overrides_keep_unset_keys() {
        let mut file = AppConfig::default();
        file.extraction.max_depth = 16;
        file.news.timeout_secs = 3;

        let config = file
            .apply_overrides(overrides(&[("LOG_LEVEL", "debug")]))
            .unwrap();

        assert_eq!(config.extraction.max_depth, 16);
        assert_eq!(config.news.timeout_secs, 3);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_overrides_reject_bad_numbers() {
        let result =
            AppConfig::default().apply_overrides(overrides(&[("RUFEERS_MAX_DEPTH", "deep")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.news.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "news.timeout_secs"
        ));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("LOC, GPE,,FAC "), vec!["LOC", "GPE", "FAC"]);
    }
}
