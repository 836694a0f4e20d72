use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::processor::barcode_normalizer::DEFAULT_TARGET_WIDTH;
use crate::processor::record_classifier::{DEFAULT_MIN_DESCRIPTION_LEN, DEFAULT_MIN_SIZE_ML};
use crate::processor::recommender::DEFAULT_SUGGESTION_FANOUT;

pub const MIN_BATCH_SIZE: usize = 50;
pub const MAX_BATCH_SIZE: usize = 5000;
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const ENDPOINT_ENV: &str = "PINOT_API_ENDPOINT";
const AUTH_ENV: &str = "PINOT_AUTH_HEADER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfigFile {
    pub catalog: CatalogSection,
    #[serde(default)]
    pub rules: RuleSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default)]
    pub endpoint: String,
    pub authorization: Option<String>,
    #[serde(default)]
    pub stub_mode: bool,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSection {
    #[serde(default)]
    pub extra_vague_terms: Vec<String>,
    pub min_description_len: Option<usize>,
    pub min_size_ml: Option<f64>,
    pub barcode_width: Option<usize>,
    pub suggestion_fanout: Option<usize>,
}

/// Immutable per-run configuration, constructed once and passed into each
/// pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub catalog: CatalogConfig,
    pub rules: RuleConfig,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub endpoint: String,
    pub authorization: Option<String>,
    pub stub_mode: bool,
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub extra_vague_terms: Vec<String>,
    pub min_description_len: usize,
    pub min_size_ml: f64,
    pub barcode_width: usize,
    pub suggestion_fanout: usize,
}

impl PipelineConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config file: {}", path))?;

        let config_file: PipelineConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config file: {}", path))?;

        let mut config = Self::from_sections(config_file);
        config.load_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_sections(file: PipelineConfigFile) -> Self {
        PipelineConfig {
            catalog: CatalogConfig {
                endpoint: file.catalog.endpoint,
                authorization: file.catalog.authorization,
                stub_mode: file.catalog.stub_mode,
                batch_size: file.catalog.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            },
            rules: RuleConfig {
                extra_vague_terms: file.rules.extra_vague_terms,
                min_description_len: file
                    .rules
                    .min_description_len
                    .unwrap_or(DEFAULT_MIN_DESCRIPTION_LEN),
                min_size_ml: file.rules.min_size_ml.unwrap_or(DEFAULT_MIN_SIZE_ML),
                barcode_width: file.rules.barcode_width.unwrap_or(DEFAULT_TARGET_WIDTH),
                suggestion_fanout: file
                    .rules
                    .suggestion_fanout
                    .unwrap_or(DEFAULT_SUGGESTION_FANOUT),
            },
        }
    }

    /// Environment wins over the config file for the remote endpoint and
    /// its credential, matching how deployments inject secrets.
    pub fn load_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
            if !endpoint.is_empty() {
                self.catalog.endpoint = endpoint;
            }
        }
        if let Ok(auth) = env::var(AUTH_ENV) {
            if !auth.is_empty() {
                self.catalog.authorization = Some(auth);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.catalog.batch_size) {
            return Err(anyhow!(
                "batch_size must be between {} and {}, got {}",
                MIN_BATCH_SIZE,
                MAX_BATCH_SIZE,
                self.catalog.batch_size
            ));
        }

        if !self.catalog.stub_mode && self.catalog.endpoint.is_empty() {
            return Err(anyhow!(
                "catalog endpoint is required when stub mode is off (set {} or [catalog] endpoint)",
                ENDPOINT_ENV
            ));
        }

        if self.rules.barcode_width == 0 || self.rules.barcode_width > 14 {
            return Err(anyhow!(
                "barcode_width must be between 1 and 14, got {}",
                self.rules.barcode_width
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            catalog: CatalogConfig {
                endpoint: String::new(),
                authorization: None,
                stub_mode: true,
                batch_size: DEFAULT_BATCH_SIZE,
            },
            rules: RuleConfig {
                extra_vague_terms: Vec::new(),
                min_description_len: DEFAULT_MIN_DESCRIPTION_LEN,
                min_size_ml: DEFAULT_MIN_SIZE_ML,
                barcode_width: DEFAULT_TARGET_WIDTH,
                suggestion_fanout: DEFAULT_SUGGESTION_FANOUT,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.catalog.stub_mode);
        assert_eq!(config.catalog.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.rules.min_description_len, 10);
        assert_eq!(config.rules.min_size_ml, 750.0);
        assert_eq!(config.rules.barcode_width, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = PipelineConfig::default();
        config.catalog.batch_size = 49;
        assert!(config.validate().is_err());

        config.catalog.batch_size = 5001;
        assert!(config.validate().is_err());

        config.catalog.batch_size = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_required_without_stub() {
        let mut config = PipelineConfig::default();
        config.catalog.stub_mode = false;
        assert!(config.validate().is_err());

        config.catalog.endpoint = "https://pinot.example.com/query/sql".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_sections() {
        let raw = r#"
            [catalog]
            endpoint = "https://pinot.example.com/query/sql"
            stub_mode = false
            batch_size = 500

            [rules]
            extra_vague_terms = ["seasonal"]
            min_size_ml = 500.0
        "#;
        let file: PipelineConfigFile = toml::from_str(raw).unwrap();
        let config = PipelineConfig::from_sections(file);

        assert_eq!(config.catalog.batch_size, 500);
        assert_eq!(config.rules.extra_vague_terms, vec!["seasonal".to_string()]);
        assert_eq!(config.rules.min_size_ml, 500.0);
        // Unset values fall back to defaults.
        assert_eq!(config.rules.min_description_len, 10);
    }

    #[test]
    fn test_env_override_wins() {
        unsafe {
            env::set_var(ENDPOINT_ENV, "https://override.example.com/query/sql");
        }

        let mut config = PipelineConfig::default();
        config.load_env_overrides();
        assert_eq!(
            config.catalog.endpoint,
            "https://override.example.com/query/sql"
        );

        unsafe {
            env::remove_var(ENDPOINT_ENV);
        }
    }
}
