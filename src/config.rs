//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aicr.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".aicr.toml";

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Tool output limits.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub name: String,

    /// Chat-completions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Sampling temperature. Omitted from requests when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum model calls per review.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            temperature: None,
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_rounds() -> usize {
    100
}

/// Limits applied to tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Characters kept from a single file read.
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,

    /// Files read by one `read_multiple_files` call.
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: usize,

    /// Characters kept from `git diff` output.
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,

    /// Code files listed by `analyze_directory`.
    #[serde(default = "default_max_listed_code_files")]
    pub max_listed_code_files: usize,

    /// Characters kept from `list_files` and `search_in_files` output.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_file_chars: default_max_file_chars(),
            max_batch_files: default_max_batch_files(),
            max_diff_chars: default_max_diff_chars(),
            max_listed_code_files: default_max_listed_code_files(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

fn default_max_file_chars() -> usize {
    10_000
}

fn default_max_batch_files() -> usize {
    10
}

fn default_max_diff_chars() -> usize {
    20_000
}

fn default_max_listed_code_files() -> usize {
    50
}

fn default_max_output_chars() -> usize {
    20_000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.aicr.toml` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.model.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = Some(temperature);
        }
        if let Some(max_rounds) = args.max_rounds {
            self.model.max_rounds = max_rounds;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that would make every review fail.
    ///
    /// Runs on the merged configuration, so limits from the config file are
    /// held to the same bounds as their CLI flags.
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_seconds == 0 {
            bail!("model.timeout_seconds must be at least 1");
        }
        if self.model.max_rounds == 0 {
            bail!("model.max_rounds must be at least 1");
        }
        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                bail!("model.temperature must be between 0.0 and 2.0");
            }
        }
        if !self.model.api_url.starts_with("http://") && !self.model.api_url.starts_with("https://")
        {
            bail!("model.api_url must start with 'http://' or 'https://'");
        }

        let tools = &self.tools;
        for (name, value) in [
            ("tools.max_file_chars", tools.max_file_chars),
            ("tools.max_batch_files", tools.max_batch_files),
            ("tools.max_diff_chars", tools.max_diff_chars),
            ("tools.max_output_chars", tools.max_output_chars),
        ] {
            if value == 0 {
                bail!("{} must be at least 1", name);
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Read the API key from the environment.
pub fn api_key_from_env() -> Result<String> {
    check_api_key(std::env::var(API_KEY_ENV).ok())
}

fn check_api_key(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => bail!("{} environment variable is not set", API_KEY_ENV),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "deepseek-chat");
        assert_eq!(
            config.model.api_url,
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(config.model.timeout_seconds, 300);
        assert_eq!(config.model.max_rounds, 100);
        assert_eq!(config.model.temperature, None);
        assert_eq!(config.tools.max_file_chars, 10_000);
        assert_eq!(config.tools.max_batch_files, 10);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[model]
name = "deepseek-coder"
temperature = 0.2
max_rounds = 20

[tools]
max_diff_chars = 5000
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.model.name, "deepseek-coder");
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.model.max_rounds, 20);
        assert_eq!(config.model.timeout_seconds, 300);
        assert_eq!(config.tools.max_diff_chars, 5000);
        assert_eq!(config.tools.max_file_chars, 10_000);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "[model]\nname = \"from-file\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.model.name, "from-file");
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[model\nname = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_merge_only_overrides_provided_args() {
        let mut config = Config::default();
        config.model.name = "from-file".to_string();
        config.model.max_rounds = 7;

        let mut args = make_args();
        args.timeout = Some(60);
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "from-file");
        assert_eq!(config.model.max_rounds, 7);
        assert_eq!(config.model.timeout_seconds, 60);

        args.model = Some("cli-model".to_string());
        args.max_rounds = Some(3);
        args.temperature = Some(0.5);
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "cli-model");
        assert_eq!(config.model.max_rounds, 3);
        assert_eq!(config.model.temperature, Some(0.5));
    }

    #[test]
    fn test_validate_rejects_zero_limits_from_file() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[model]\nmax_rounds = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_rounds"));

        let config: Config = toml::from_str("[model]\ntimeout_seconds = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));

        let config: Config = toml::from_str("[tools]\nmax_output_chars = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[model]\napi_url = \"localhost:8080\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_override_repairs_file_value() {
        let mut config: Config = toml::from_str("[model]\nmax_rounds = 0\n").unwrap();
        let mut args = make_args();
        args.max_rounds = Some(5);

        config.merge_with_args(&args);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[tools]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tools, ToolsConfig::default());
    }

    #[test]
    fn test_check_api_key() {
        assert_eq!(check_api_key(Some("sk-1".to_string())).unwrap(), "sk-1");
        assert!(check_api_key(Some("   ".to_string())).is_err());

        let err = check_api_key(None).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }
}
