//! Configuration management.
//!
//! krt-lint configuration can come from:
//! - Environment variables (KRT_LINT_*)
//! - Config file (~/.config/krt-lint/config.toml)
//!
//! Command-line flags take precedence over both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::warn;

/// krt-lint configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Report output
    #[serde(default)]
    pub output: OutputConfig,

    /// Validation behaviour
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Report output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How validation reports are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Fill omitted optional fields before validating
    #[serde(default = "default_apply_defaults")]
    pub apply_defaults: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            apply_defaults: default_apply_defaults(),
        }
    }
}

fn default_apply_defaults() -> bool {
    true
}

impl Config {
    /// Load configuration from default locations.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::config_dir().join("config.toml");
        if let Ok(partial) = Self::load_partial_from_path(&path) {
            config.apply_partial(partial);
        }

        config.apply_env_overrides();
        config
    }

    /// Load configuration from an explicit file, without env overrides.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| crate::Error::ReadingFile {
            path: path.to_path_buf(),
            source,
        })?;
        let partial: PartialConfig =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;

        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("krt-lint"))
            .unwrap_or_else(|| PathBuf::from(".krt-lint"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(format) = lookup("KRT_LINT_OUTPUT_FORMAT") {
            match OutputFormat::parse(&format) {
                Some(parsed) => self.output.format = parsed,
                None => warn!(value = %format, "ignoring unknown KRT_LINT_OUTPUT_FORMAT"),
            }
        }
        if let Some(apply) = lookup("KRT_LINT_APPLY_DEFAULTS") {
            if let Ok(parsed) = apply.parse::<bool>() {
                self.validation.apply_defaults = parsed;
            }
        }
    }

    fn load_partial_from_path(path: &Path) -> std::result::Result<PartialConfig, ()> {
        let content = std::fs::read_to_string(path).map_err(|_| ())?;
        toml::from_str(&content).map_err(|_| ())
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(output) = partial.output {
            self.output = output;
        }
        if let Some(validation) = partial.validation {
            self.validation = validation;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    output: Option<OutputConfig>,
    validation: Option<ValidationConfig>,
}
