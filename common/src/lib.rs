/*!
common/src/lib.rs

Shared configuration types and the topic catalog for newsdigest.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for TOML config files, with default/override merging
- Environment-variable overrides applied on top of the file configuration
*/

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

pub mod topics;

/// Default headlines API root (NewsAPI v2)
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
/// Placeholder value shipped in sample configs; treated as "not configured"
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";
/// Shortest secret accepted for cookie encryption, in bytes
pub const MIN_SECRET_KEY_BYTES: usize = 32;

/// Application-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Passphrase for private (session) cookies, at least 32 bytes
    pub secret_key: Option<String>,
    /// Verbose server logging
    pub debug: Option<bool>,
}

/// HTTP server binding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Headlines API configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsApiConfig {
    pub api_key: Option<String>,
    /// Name of the env var holding the key (default: NEWS_API_KEY)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Generative model configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "gemini", "remote", "none"
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl LlmConfig {
    pub fn adapter(&self) -> &str {
        self.adapter.as_deref().unwrap_or("gemini")
    }

    /// Env var consulted for the model API key when `api_key_env` is not set
    pub fn default_api_key_env(&self) -> &'static str {
        match self.adapter() {
            "remote" => "OPENAI_API_KEY",
            _ => "GOOGLE_API_KEY",
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref())
    }
}

/// Where the configuration values came from (reported by the debug endpoint)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    #[default]
    EnvironmentVariables,
    ConfigFile,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub news_api: NewsApiConfig,
    pub llm: Option<LlmConfig>,
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// When neither file exists the result is an empty config, to be filled from the environment.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());
        let mut loaded_any = false;

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
            loaded_any = true;
        }

        let mut cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        if loaded_any {
            cfg.source = ConfigSource::ConfigFile;
        }
        Ok(cfg)
    }

    /// Apply process environment overrides. See [`Config::apply_env_from`].
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay values found through `lookup` on top of the file configuration.
    ///
    /// Keys are resolved here once, so the rest of the program never reads the environment.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let news_env = self
            .news_api
            .api_key_env
            .clone()
            .unwrap_or_else(|| "NEWS_API_KEY".to_string());
        if let Some(key) = lookup(&news_env) {
            self.news_api.api_key = Some(key);
        }
        if let Some(url) = lookup("NEWS_API_BASE_URL") {
            self.news_api.base_url = Some(url);
        }

        let llm = self.llm.get_or_insert_with(LlmConfig::default);
        let llm_env = llm
            .api_key_env
            .clone()
            .unwrap_or_else(|| llm.default_api_key_env().to_string());
        if let Some(key) = lookup(&llm_env) {
            llm.api_key = Some(key);
        }
        if llm.adapter() == "gemini" {
            if let Some(model) = lookup("GEMINI_MODEL") {
                llm.model = Some(model);
            }
        }

        if let Some(secret) = lookup("SECRET_KEY") {
            self.app.secret_key = Some(secret);
        }
        if let Some(debug) = lookup("DEBUG") {
            self.app.debug = Some(debug.eq_ignore_ascii_case("true"));
        }
        if let Some(host) = lookup("HOST") {
            self.server.bind = Some(host);
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = Some(port);
        }
    }

    /// Sanity-check values that would otherwise only fail at request time.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(self.news_base_url())
            .with_context(|| format!("Invalid news_api.base_url: {}", self.news_base_url()))?;
        if let Some(api_url) = self.llm.as_ref().and_then(|l| l.api_url.as_deref()) {
            url::Url::parse(api_url).with_context(|| format!("Invalid llm.api_url: {}", api_url))?;
        }
        self.session_secret()?;
        Ok(())
    }

    /// Cookie encryption key derived from `app.secret_key`, base64 encoded.
    ///
    /// Any passphrase of at least 32 bytes is accepted; the key is its SHA-256
    /// digest, so the same passphrase keeps sessions valid across restarts.
    /// Returns `Ok(None)` when no secret is configured.
    pub fn session_secret(&self) -> Result<Option<String>> {
        let Some(secret) = self.app.secret_key.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        if secret.len() < MIN_SECRET_KEY_BYTES {
            bail!(
                "SECRET_KEY (app.secret_key) must be at least {} bytes long, got {}",
                MIN_SECRET_KEY_BYTES,
                secret.len()
            );
        }
        let digest = Sha256::digest(secret.as_bytes());
        Ok(Some(general_purpose::STANDARD.encode(digest)))
    }

    /// The headlines API key, if one is actually usable.
    pub fn news_api_key(&self) -> Option<&str> {
        usable_key(self.news_api.api_key.as_deref())
    }

    pub fn news_base_url(&self) -> &str {
        self.news_api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_NEWS_API_BASE_URL)
    }

    pub fn news_page_size(&self) -> u32 {
        self.news_api.page_size.unwrap_or(10)
    }

    pub fn server_bind(&self) -> &str {
        self.server.bind.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn server_port(&self) -> u16 {
        self.server.port.unwrap_or(5000)
    }

    pub fn debug(&self) -> bool {
        self.app.debug.unwrap_or(false)
    }
}

/// Trim a key and drop it when blank or still the sample placeholder.
pub fn usable_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Mask a secret for logging: everything but the last four characters becomes `*`.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
