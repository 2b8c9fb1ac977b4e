use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/leafdoc.yaml";
pub const ENV_CONFIG_PATH: &str = "LEAFDOC_CONFIG";
pub const DEFAULT_ADVISORY_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_ADVISORY_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub classifier: ClassifierConfig,
    pub advisory: AdvisoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/uploads"),
            max_bytes: 16 * 1024 * 1024,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    /// Set when the artifact emits raw logits instead of probabilities.
    pub apply_softmax: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("trained_model.pt"),
            apply_softmax: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub total_timeout_secs: u64,
    pub retry: RetryConfig,
    /// Only ever populated from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ADVISORY_ENDPOINT.to_string(),
            model: DEFAULT_ADVISORY_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 800,
            request_timeout_secs: 30,
            total_timeout_secs: 90,
            retry: RetryConfig::default(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 4_000,
            jitter: true,
        }
    }
}

impl AppConfig {
    /// Reads the YAML file named by `LEAFDOC_CONFIG` (or the default path), then
    /// applies environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        log::info!("Loading configuration from {}", path.display());
        let mut config = Self::from_file(&path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        self.apply_env_from(&std::env::vars().collect());
    }

    /// Applies `PORT`, `UPLOAD_FOLDER`, `MODEL_PATH` and `API_KEY` from the
    /// given map. An unparsable port is ignored; a blank key counts as unset.
    pub fn apply_env_from(&mut self, env: &HashMap<String, String>) {
        if let Some(port) = env.get("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = env.get("UPLOAD_FOLDER") {
            self.upload.dir = PathBuf::from(dir);
        }
        if let Some(model_path) = env.get("MODEL_PATH") {
            self.classifier.model_path = PathBuf::from(model_path);
        }
        self.advisory.api_key = env
            .get("API_KEY")
            .filter(|k| !k.trim().is_empty())
            .cloned();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".into()));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "upload.allowed_extensions must not be empty".into(),
            ));
        }
        if self.advisory.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "advisory.retry.max_attempts must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.advisory.temperature) {
            return Err(ConfigError::Invalid(format!(
                "advisory.temperature {} outside [0, 2]",
                self.advisory.temperature
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
