use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::{GenerateOptions, OllamaConfig};
use crate::refine::{DEFAULT_MAX_ROUNDS, MAX_ROUNDS_LIMIT, RefinementConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub refinement: RefinementSettings,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: crate::llm::ollama::DEFAULT_BASE_URL.to_string(),
            model: crate::llm::ollama::DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 2000,
            timeout_ms: 120000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementSettings {
    pub max_rounds: u32,
    pub max_rounds_limit: u32,
}

impl Default for RefinementSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_rounds_limit: MAX_ROUNDS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub max_sessions: usize,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Sampling temperature for web sessions
    pub temperature: f32,
    /// Token limit for web sessions
    pub max_tokens: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            max_sessions: 64,
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            refinement: RefinementSettings::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.llm.timeout_ms)
    }

    /// Connection settings for the Ollama client.
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            timeout: self.timeout(),
        }
    }

    /// Loop settings for console runs.
    pub fn console_refinement(&self) -> RefinementConfig {
        self.refinement_with(self.llm.temperature, self.llm.max_tokens)
    }

    /// Loop settings for web sessions.
    pub fn server_refinement(&self) -> RefinementConfig {
        self.refinement_with(self.server.temperature, self.server.max_tokens)
    }

    fn refinement_with(&self, temperature: f32, max_output_tokens: u32) -> RefinementConfig {
        RefinementConfig {
            model: self.llm.model.clone(),
            options: GenerateOptions {
                temperature,
                max_output_tokens,
            },
            call_timeout: Some(self.timeout()),
            max_rounds_limit: self.refinement.max_rounds_limit,
        }
    }
}
