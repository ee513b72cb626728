use crate::relay::prompt::Persona;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::log::{debug, warn};

/// Port used when neither the config file nor `PORT` say otherwise.
pub const DEVELOPMENT_PORT: u16 = 5000;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[cfg(feature = "sentry")]
    pub sentry: Option<SentryConfig>,

    #[serde(default)]
    pub http: HTTPConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    /// Never read from the config file, only from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub openai_api_key: Option<String>,
}
impl AppConfig {
    /// Loads the TOML config (explicit path, else `config.toml` if present, else defaults)
    /// and then applies environment overrides.
    pub fn load(config_filepath: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_filepath {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No {DEFAULT_CONFIG_PATH} found, using default configuration");
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse TOML config file: {config_path:?}"))
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT environment variable: {port:?}"))?;
            self.http.address.set_port(port);
        }

        self.openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if self.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set, completions will be unavailable!");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.http.address.port() == DEVELOPMENT_PORT
    }
}

#[cfg(feature = "sentry")]
#[derive(Debug, Deserialize)]
pub struct SentryConfig {
    pub dsn: String,

    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default)]
    pub server_name: Option<String>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_true")]
    pub send_default_pii: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HTTPConfig {
    #[serde(default = "default_http_address")]
    pub address: SocketAddr,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default)]
    pub tls: Option<TLSConfig>,
}
impl Default for HTTPConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            service_name: default_service_name(),
            tls: None,
        }
    }
}

#[cfg_attr(
    not(any(feature = "tls-rustls", feature = "tls-native")),
    allow(dead_code)
)]
#[derive(Debug, Clone, Deserialize)]
pub struct TLSConfig {
    #[serde(deserialize_with = "deserialize_existing_file")]
    pub certificate_path: PathBuf,

    #[serde(deserialize_with = "deserialize_existing_file")]
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// No timeout is applied unless set, leaving it to the HTTP client.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}
impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub persona: Persona,

    /// Overrides the persona preset. `{name}` is replaced with the sender display name.
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default = "default_display_name")]
    pub default_name: String,
}
impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            template: None,
            default_name: default_display_name(),
        }
    }
}

fn default_http_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEVELOPMENT_PORT)
}
fn default_service_name() -> String {
    "Metro WhatsApp Bot".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_max_tokens() -> u32 {
    400
}
fn default_temperature() -> f32 {
    0.7
}
fn default_display_name() -> String {
    "Customer".to_string()
}

#[cfg(feature = "sentry")]
fn default_true() -> bool {
    true
}

fn deserialize_existing_file<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path = PathBuf::deserialize(deserializer)?;
    if !path.exists() {
        return Err(serde::de::Error::custom(format!(
            "File does not exist: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(serde::de::Error::custom(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.http.address.port(), DEVELOPMENT_PORT);
        assert_eq!(config.completion.model, "gpt-4");
        assert_eq!(config.completion.max_tokens, 400);
        assert!((config.completion.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.completion.request_timeout_secs, None);
        assert_eq!(config.prompt.persona, Persona::MaterialsAdvisor);
        assert_eq!(config.prompt.default_name, "Customer");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [http]
            address = "127.0.0.1:8080"
            service_name = "Support Bot"

            [completion]
            api_base = "http://localhost:9999/v1"
            model = "gpt-3.5-turbo"
            max_tokens = 150
            temperature = 0.2
            request_timeout_secs = 20

            [prompt]
            persona = "support"
            default_name = "Client"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.http.service_name, "Support Bot");
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
        assert_eq!(config.completion.max_tokens, 150);
        assert_eq!(config.completion.request_timeout_secs, Some(20));
        assert_eq!(config.prompt.persona, Persona::Support);
        assert_eq!(config.prompt.default_name, "Client");
        assert!(!config.is_development());
    }

    #[test]
    fn test_tls_requires_existing_files() {
        let result = toml::from_str::<AppConfig>(
            r#"
            [http.tls]
            certificate_path = "/definitely/not/here.pem"
            key_path = "/definitely/not/here.key"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("PORT", "8080"), ("OPENAI_API_KEY", " sk-test ")]))
            .unwrap();

        assert_eq!(config.http.address.port(), 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert!(!config.is_development());
    }

    #[test]
    fn test_env_empty_key_is_unconfigured() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "  ")])).unwrap();

        assert!(config.openai_api_key.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("PORT", "not-a-port")])).is_err());
    }
}
