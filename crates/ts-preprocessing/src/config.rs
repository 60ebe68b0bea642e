//! Configuration for the time-series preprocessor.
//!
//! This module provides configuration options using the builder pattern.
//! Configurations are serde-compatible so they can be read from a JSON file.

use crate::normalizer::Frequency;
use serde::{Deserialize, Serialize};

/// Configuration shared by every format variant.
///
/// Use [`PreprocessConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use ts_preprocessing::config::PreprocessConfig;
///
/// let config = PreprocessConfig::builder()
///     .frequency("6H".parse()?)
///     .csv_separator(';')
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Step of the normalization grid.
    /// Default: daily ("D")
    pub frequency: Frequency,

    /// Field separator for delimited-text sources. `.tsv` files always use a tab.
    /// Default: ','
    pub csv_separator: char,

    /// Number of rows sampled to infer delimited-text column types.
    /// `None` scans the whole file.
    /// Default: Some(100)
    pub infer_schema_length: Option<usize>,

    /// Zero-based index of the spreadsheet sheet to read.
    /// Default: 0 (first sheet)
    pub sheet_index: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::daily(),
            csv_separator: ',',
            infer_schema_length: Some(100),
            sheet_index: 0,
        }
    }
}

impl PreprocessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let sep = self.csv_separator;
        if !sep.is_ascii() || sep.is_ascii_alphanumeric() || sep == '"' || sep == '\n' {
            return Err(ConfigValidationError::InvalidSeparator(sep));
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidSchemaLength);
        }

        Ok(())
    }

    /// Separator as the byte the CSV reader expects.
    pub(crate) fn separator_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.csv_separator as u8
    }

    /// Read and validate a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigValidationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigValidationError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid CSV separator {0:?} (must be an ASCII punctuation or whitespace character)")]
    InvalidSeparator(char),

    #[error("Invalid schema inference length: 0 (use None to scan the whole file)")]
    InvalidSchemaLength,

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Builder for [`PreprocessConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PreprocessConfigBuilder {
    frequency: Option<Frequency>,
    csv_separator: Option<char>,
    infer_schema_length: Option<Option<usize>>,
    sheet_index: Option<usize>,
}

impl PreprocessConfigBuilder {
    /// Set the normalization grid step.
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Set the delimited-text field separator.
    pub fn csv_separator(mut self, separator: char) -> Self {
        self.csv_separator = Some(separator);
        self
    }

    /// Set how many rows are sampled for CSV type inference.
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Select the spreadsheet sheet by zero-based index.
    pub fn sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = Some(index);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PreprocessConfig` or an error if validation fails.
    pub fn build(self) -> Result<PreprocessConfig, ConfigValidationError> {
        let defaults = PreprocessConfig::default();
        let config = PreprocessConfig {
            frequency: self.frequency.unwrap_or(defaults.frequency),
            csv_separator: self.csv_separator.unwrap_or(defaults.csv_separator),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            sheet_index: self.sheet_index.unwrap_or(defaults.sheet_index),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessConfig::default();
        assert_eq!(config.frequency, Frequency::daily());
        assert_eq!(config.csv_separator, ',');
        assert_eq!(config.infer_schema_length, Some(100));
        assert_eq!(config.sheet_index, 0);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PreprocessConfig::builder()
            .frequency("6H".parse().unwrap())
            .csv_separator(';')
            .infer_schema_length(None)
            .sheet_index(2)
            .build()
            .unwrap();

        assert_eq!(config.frequency.to_string(), "6H");
        assert_eq!(config.separator_byte(), b';');
        assert_eq!(config.infer_schema_length, None);
        assert_eq!(config.sheet_index, 2);
    }

    #[test]
    fn test_validation_invalid_separator() {
        let result = PreprocessConfig::builder().csv_separator('a').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator('a')
        ));

        let result = PreprocessConfig::builder().csv_separator('"').build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_zero_schema_length() {
        let result = PreprocessConfig::builder()
            .infer_schema_length(Some(0))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSchemaLength
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "frequency": "12H",
            "csv_separator": "\t",
            "sheet_index": 1
        }"#;

        let config = PreprocessConfig::from_json(json).expect("Should deserialize");
        assert_eq!(config.frequency.to_string(), "12H");
        assert_eq!(config.csv_separator, '\t');
        assert_eq!(config.sheet_index, 1);
        // missing fields fall back to defaults
        assert_eq!(config.infer_schema_length, Some(100));
    }

    #[test]
    fn test_config_from_json_rejects_bad_frequency() {
        let json = r#"{ "frequency": "M" }"#;
        assert!(matches!(
            PreprocessConfig::from_json(json),
            Err(ConfigValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PreprocessConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"frequency\":\"D\""));
        let back: PreprocessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
