// summarize-mcp configuration management

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CLEANUP_DELAY_SECS: u64 = 10;
const DEFAULT_STALE_AFTER_SECS: u64 = 3600;

/// Environment variable holding the speech API credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// File name of the saved voice/tone preferences, kept directly in the home directory
const STATE_FILE_NAME: &str = ".summarize-mcp-state.json";

/// Name of the scratch directory created under the system temp dir
const SCRATCH_DIR_NAME: &str = "summarize-mcp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TTS model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds to wait after playback starts before deleting the audio file
    #[serde(default = "default_cleanup_delay_secs")]
    pub cleanup_delay_secs: u64,

    /// Leftover audio files older than this are removed at startup
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Scratch directory override (default: <system temp>/summarize-mcp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cleanup_delay_secs() -> u64 {
    DEFAULT_CLEANUP_DELAY_SECS
}

fn default_stale_after_secs() -> u64 {
    DEFAULT_STALE_AFTER_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            cleanup_delay_secs: default_cleanup_delay_secs(),
            stale_after_secs: default_stale_after_secs(),
            temp_dir: None,
        }
    }
}

impl Config {
    /// Get the config directory: ~/.config/cli-programs
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cli-programs"))
    }

    /// Get the config file path: ~/.config/cli-programs/summarize-mcp.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("summarize-mcp.toml"))
    }

    /// Path of the saved preferences file: ~/.summarize-mcp-state.json
    pub fn state_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(STATE_FILE_NAME))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Update a single setting by key, as used by `config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model" => self.model = value.to_string(),
            "base_url" => self.base_url = value.to_string(),
            "cleanup_delay_secs" => {
                self.cleanup_delay_secs = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: {}", value))?;
            }
            "stale_after_secs" => {
                self.stale_after_secs = value
                    .parse()
                    .with_context(|| format!("Invalid number of seconds: {}", value))?;
            }
            "temp_dir" => self.temp_dir = Some(PathBuf::from(value)),
            _ => bail!(
                "Unknown config key: {}. Available: model, base_url, cleanup_delay_secs, stale_after_secs, temp_dir",
                key
            ),
        }
        Ok(())
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(SCRATCH_DIR_NAME))
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

/// Read the API credential from the environment; an empty value counts as missing
pub fn api_key_from_env() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("{} environment variable is required", API_KEY_ENV),
    }
}
