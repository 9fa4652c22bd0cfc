use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the Gemini API
    pub gemini_api_key: Option<String>,

    /// Model used for consultations
    pub model: String,

    /// Base URL of the generative language endpoint
    pub base_url: String,

    /// Sampling temperature sent with every request
    pub temperature: f32,

    /// Nucleus sampling parameter sent with every request
    pub top_p: f32,

    /// Oculo home directory
    #[serde(skip)]
    pub oculo_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            gemini_api_key: None,
            model: "gemini-3-pro-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            oculo_home: home.join(".oculo"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.oculo/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let oculo_home = home.join(".oculo");
        let config_path = oculo_home.join("config.toml");

        fs::create_dir_all(&oculo_home)
            .context("Failed to create .oculo directory")?;

        let mut config: Config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.oculo_home = oculo_home;

        Ok(config)
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let config_path = self.oculo_home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Get API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.gemini_api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}
