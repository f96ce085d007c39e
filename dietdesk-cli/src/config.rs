use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use dietdesk_core::Session;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the platform API
    pub api_url: ConfigValue<String>,
    /// Bearer token of the signed-in dietitian
    #[serde(serialize_with = "mask_token")]
    pub token: ConfigValue<Option<String>>,
    pub dietitian_id: ConfigValue<Option<String>>,
    pub dietitian_name: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
    /// Period of `calendar watch` refreshes
    pub refresh_interval_secs: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    token: Option<String>,
    dietitian_id: Option<String>,
    dietitian_name: Option<String>,
    request_timeout_secs: Option<u64>,
    refresh_interval_secs: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut api_url = ConfigValue::new(DEFAULT_API_URL.to_string(), ConfigSource::Default);
        let mut token = ConfigValue::new(None, ConfigSource::Default);
        let mut dietitian_id = ConfigValue::new(None, ConfigSource::Default);
        let mut dietitian_name = ConfigValue::new("Dietitian".to_string(), ConfigSource::Default);
        let mut request_timeout_secs = ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default);
        let mut refresh_interval_secs =
            ConfigValue::new(DEFAULT_REFRESH_SECS, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.api_url {
                api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(t) = file_config.token {
                token = ConfigValue::new(Some(t), ConfigSource::File);
            }
            if let Some(id) = file_config.dietitian_id {
                dietitian_id = ConfigValue::new(Some(id), ConfigSource::File);
            }
            if let Some(name) = file_config.dietitian_name {
                dietitian_name = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(secs) = file_config.request_timeout_secs {
                request_timeout_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(secs) = file_config.refresh_interval_secs {
                refresh_interval_secs = ConfigValue::new(secs, ConfigSource::File);
            }
        }

        if let Ok(url) = std::env::var("DIETDESK_API_URL") {
            api_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(t) = std::env::var("DIETDESK_TOKEN") {
            token = ConfigValue::new(Some(t), ConfigSource::Environment);
        }
        if let Ok(id) = std::env::var("DIETDESK_DIETITIAN_ID") {
            dietitian_id = ConfigValue::new(Some(id), ConfigSource::Environment);
        }

        Ok(Self {
            api_url,
            token,
            dietitian_id,
            dietitian_name,
            request_timeout_secs,
            refresh_interval_secs,
            config_file,
        })
    }

    /// Builds the dietitian session the commands act under.
    pub fn session(&self) -> Result<Session, ConfigError> {
        let token = self
            .token
            .value
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("token"))?;
        let id = self
            .dietitian_id
            .value
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::Missing("dietitian_id"))?;
        Ok(Session::dietitian(
            self.api_url.value.as_str(),
            token,
            id,
            self.dietitian_name.value.as_str(),
        ))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.value.max(1))
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/dietdesk/
    /// - macOS: ~/Library/Application Support/dietdesk/
    /// - Windows: %APPDATA%/dietdesk/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dietdesk")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn mask_token<S: Serializer>(
    token: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let masked = ConfigValue::new(token.value.as_ref().map(|_| "****"), token.source.clone());
    masked.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Missing(key) => write!(
                f,
                "'{}' is not configured. Set it in the config file or via DIETDESK_{}",
                key,
                key.to_uppercase()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
