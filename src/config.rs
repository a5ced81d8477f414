use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Main configuration structure loaded from glass_mind.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub label: LabelConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Hosted model selection and sampling parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
        }
    }
}

/// Prompt composition settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    /// How many earlier questions are summarized into the system prompt
    pub history_limit: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

/// Transparency label settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelConfig {
    pub enabled: bool,
    /// Display name of the model vendor, e.g. "OpenAI"
    pub provider: String,
    /// Display name of the model, e.g. "GPT-4-Turbo"
    pub model_name: String,
    pub training_data_cutoff: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "OpenAI".to_string(),
            model_name: "GPT-4-Turbo".to_string(),
            training_data_cutoff: "April 2024".to_string(),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub log_level: String,
    pub http_bind: SocketAddr,
    pub request_timeout_ms: u64,
}

const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8787);
const DEFAULT_LOG_LEVEL: &str = "glass_mind=info,tower_http=info";

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_bind: DEFAULT_BIND,
            request_timeout_ms: 60_000,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let defaults = Self::default();
        let http_bind = match std::env::var("GLASS_HTTP_BIND") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("GLASS_HTTP_BIND '{}' is not a socket address, using {}", raw, DEFAULT_BIND);
                defaults.http_bind
            }),
            Err(_) => defaults.http_bind,
        };

        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            http_bind,
            request_timeout_ms: std::env::var("GLASS_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&ms: &u64| ms > 0)
                .unwrap_or(defaults.request_timeout_ms),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses GLASS_MIND_CONFIG or defaults to "glass_mind.toml".
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], with an explicit config path taking precedence.
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        // Explicit env file wins, else ./.env if present
        if let Ok(env_path) = std::env::var("GLASS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = path.map(str::to_string).unwrap_or_else(|| {
            std::env::var("GLASS_MIND_CONFIG").unwrap_or_else(|_| "glass_mind.toml".to_string())
        });

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GLASS_MODEL") {
            self.model.model = model;
            tracing::debug!("GLASS_MODEL env override applied");
        }
        if let Ok(base_url) = std::env::var("GLASS_MODEL_BASE_URL") {
            self.model.base_url = base_url;
            tracing::debug!("GLASS_MODEL_BASE_URL env override applied");
        }
        if let Some(temperature) = std::env::var("GLASS_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
        {
            self.model.temperature = temperature;
        }
        if let Some(max_tokens) = std::env::var("GLASS_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.model.max_tokens = max_tokens;
        }
    }

    /// Clamp out-of-range values, warning about each adjustment
    pub fn validate(&mut self) {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            let clamped = self.model.temperature.clamp(0.0, 2.0);
            tracing::warn!(
                "temperature {} outside 0.0..=2.0, clamping to {}",
                self.model.temperature,
                clamped
            );
            self.model.temperature = if clamped.is_nan() { 0.7 } else { clamped };
        }
        if self.model.max_tokens == 0 {
            tracing::warn!("max_tokens must be at least 1, using 1500");
            self.model.max_tokens = 1500;
        }
        if self.prompts.history_limit > 50 {
            tracing::warn!(
                "history_limit {} exceeds max 50, clamping to 50",
                self.prompts.history_limit
            );
            self.prompts.history_limit = 50;
        }
        if !self.model.base_url.starts_with("http://") && !self.model.base_url.starts_with("https://")
        {
            tracing::warn!(
                "Model base URL '{}' doesn't start with http:// or https://",
                self.model.base_url
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_request_parameters() {
        let config = Config::default();
        assert_eq!(config.model.model, "gpt-4-turbo-preview");
        assert_eq!(config.model.max_tokens, 1500);
        assert!((config.model.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.prompts.history_limit, 10);
        assert!(config.label.enabled);
        assert_eq!(config.runtime.http_bind.port(), 8787);
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config = Config::from_toml_str(
            r#"
            [model]
            model = "gpt-4o-mini"

            [label]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.base_url, "https://api.openai.com/v1");
        assert!(!config.label.enabled);
        assert_eq!(config.label.provider, "OpenAI");
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.model.temperature = 3.5;
        config.model.max_tokens = 0;
        config.prompts.history_limit = 500;
        config.validate();
        assert!((config.model.temperature - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.model.max_tokens, 1500);
        assert_eq!(config.prompts.history_limit, 50);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml_str("[model\nmodel = ").is_err());
    }
}
