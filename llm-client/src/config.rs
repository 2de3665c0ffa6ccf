use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{LlmError, Result};

const DEFAULT_PRESET: &str = "gemini-flash";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default preset to use when no --model flag is provided (fallback)
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Per-program default presets (program name -> preset name)
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Named model presets for quick access
    #[serde(default)]
    pub presets: HashMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

/// A named model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (gemini, anthropic, openrouter, cerebras)
    pub provider: String,

    /// Model name/identifier for the provider
    pub model: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (for API providers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, defaulting when it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| LlmError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/llm.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))
    }

    /// Get the default preset name for a specific program
    ///
    /// Falls back to `default_preset` if no program-specific default is set.
    pub fn get_default_for_program(&self, program: &str) -> &str {
        self.defaults
            .get(program)
            .map(String::as_str)
            .unwrap_or(&self.default_preset)
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut presets = HashMap::new();

        presets.insert(
            DEFAULT_PRESET.to_string(),
            ModelPreset {
                provider: "gemini".to_string(),
                model: "gemini-1.5-flash-latest".to_string(),
            },
        );
        presets.insert(
            "gemini-pro".to_string(),
            ModelPreset {
                provider: "gemini".to_string(),
                model: "gemini-1.5-pro-latest".to_string(),
            },
        );

        Self {
            default_preset: DEFAULT_PRESET.to_string(),
            defaults: HashMap::new(),
            presets,
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_preset, "gemini-flash");

        let preset = config.get_preset("gemini-flash").unwrap();
        assert_eq!(preset.provider, "gemini");
        assert_eq!(preset.model, "gemini-1.5-flash-latest");
        assert!(config.presets.contains_key("gemini-pro"));
    }

    #[test]
    fn test_invalid_preset() {
        let config = Config::default();
        let result = config.get_preset("nonexistent");
        assert!(matches!(result, Err(LlmError::InvalidPreset(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_preset, config.default_preset);
        assert_eq!(parsed.presets.len(), config.presets.len());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(
            path.to_string_lossy()
                .contains(".config/cli-programs/llm.toml")
        );
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("llm.toml");

        let mut config = Config::default();
        config.providers.insert(
            "gemini".to_string(),
            ProviderConfig {
                api_key: Some("secret".to_string()),
                base_url: None,
            },
        );
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        let provider = loaded.get_provider_config("gemini").unwrap();
        assert_eq!(provider.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.default_preset, "gemini-flash");
    }

    #[test]
    fn test_get_default_for_program() {
        let mut config = Config::default();

        // Without program-specific default, should fall back to default_preset
        assert_eq!(config.get_default_for_program("doc-translate"), "gemini-flash");

        config
            .defaults
            .insert("doc-translate".to_string(), "gemini-pro".to_string());

        assert_eq!(config.get_default_for_program("doc-translate"), "gemini-pro");

        // Unknown program should still fall back
        assert_eq!(config.get_default_for_program("other-tool"), "gemini-flash");
    }
}
