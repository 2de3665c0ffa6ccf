//! doc-translate configuration management.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::OutputFormat;
use crate::text::DEFAULT_MAX_CHARS;

// Defaults for the translation pipeline
const DEFAULT_API_CALL_DELAY_SECS: f64 = 2.0;
const DEFAULT_TARGET_LANGUAGE: &str = "繁體中文";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Maximum segment size in characters
    #[serde(default = "default_max_chars")]
    pub max_chars_per_chunk: usize,

    /// Pause between consecutive segment translations, in seconds
    #[serde(default = "default_api_call_delay")]
    pub api_call_delay_secs: f64,

    /// Language label the document is translated into
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Model preset for the polishing pass. None means reuse the translation preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polish_preset: Option<String>,

    /// Format of the written translations
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_api_call_delay() -> f64 {
    DEFAULT_API_CALL_DELAY_SECS
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            max_chars_per_chunk: default_max_chars(),
            api_call_delay_secs: default_api_call_delay(),
            target_language: default_target_language(),
            polish_preset: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl TranslateConfig {
    /// Get the config file path: ~/.config/cli-programs/doc-translate.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("doc-translate.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: TranslateConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline can't run with
    pub fn validate(&self) -> Result<()> {
        if self.max_chars_per_chunk == 0 {
            bail!("max_chars_per_chunk must be at least 1");
        }
        self.api_call_delay()?;
        if self.target_language.trim().is_empty() {
            bail!("target_language must not be empty");
        }
        Ok(())
    }

    /// Pause between segment translations. Fails for negative, non-finite
    /// or out-of-range values.
    pub fn api_call_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.api_call_delay_secs).map_err(|e| {
            anyhow!(
                "api_call_delay_secs must be a non-negative number of seconds, got {} ({})",
                self.api_call_delay_secs,
                e
            )
        })
    }
}
