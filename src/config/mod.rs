use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transcription: TranscriptionConfig,
    pub analysis: AnalysisConfig,
    pub upload: UploadConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// API key for the speech-to-text service. Falls back to GROQ_API_KEY.
    pub api_key: Option<String>,
    pub model: String,
    pub language: String,
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// API key for the text-analysis service. Falls back to GROQ_API_KEY.
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: Option<String>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted audio payload in bytes.
    pub max_bytes: usize,
    /// Client-side timeout for the upload request, in seconds.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Polling interval for the watch loop, in seconds.
    pub interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7227,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "whisper-large-v3-turbo".to_string(),
            language: "en".to_string(),
            api_endpoint: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            api_endpoint: None,
            temperature: 0.3,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            timeout_seconds: 120,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 2,
        }
    }
}

impl TranscriptionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key)
    }
}

impl AnalysisConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key)
    }
}

fn resolve_key(configured: &Option<String>) -> Option<String> {
    configured
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()))
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 7227);
        assert_eq!(config.transcription.model, "whisper-large-v3-turbo");
        assert_eq!(config.transcription.language, "en");
        assert_eq!(config.analysis.model, "llama-3.3-70b-versatile");
        assert_eq!(config.upload.max_bytes, 50 * 1024 * 1024);
        assert_eq!(config.watch.interval_seconds, 2);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [transcription]
            api_key = "gsk_test"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.transcription.api_key, Some("gsk_test".to_string()));
        // Unspecified sections keep their defaults
        assert_eq!(config.analysis.temperature, 0.3);
        assert_eq!(config.upload.timeout_seconds, 120);
    }

    #[test]
    fn test_base_url() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:7227");
    }
}
