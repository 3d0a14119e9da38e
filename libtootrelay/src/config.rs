//! Configuration management for toot-relay

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";
pub const DEFAULT_STREAM_URL: &str = "https://userstream.twitter.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
}

/// Credentials for the Twitter account whose home stream is relayed
#[derive(Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_key: String,
    pub access_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
}

/// One source account mapped onto one Mastodon account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub mastodon: MastodonConfig,
    pub twitter: MatchConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    pub server: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub screen_name: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_key", &self.access_key)
            .field("access_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("stream_url", &self.stream_url)
            .finish()
    }
}

impl fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("server", &self.server)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration, resolving the path from the explicit argument,
    /// the environment, or the default locations
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = resolve_config_path(explicit)?;
        Self::load_from_path(&config_path)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every credential and match criterion is present.
    ///
    /// An empty relay list is valid: the daemon still starts and discards
    /// every tweet.
    pub fn validate(&self) -> Result<()> {
        require("twitter.consumer_key", &self.twitter.consumer_key)?;
        require("twitter.consumer_secret", &self.twitter.consumer_secret)?;
        require("twitter.access_key", &self.twitter.access_key)?;
        require("twitter.access_secret", &self.twitter.access_secret)?;

        for (i, relay) in self.relays.iter().enumerate() {
            require(&format!("relays[{}].mastodon.server", i), &relay.mastodon.server)?;
            require(
                &format!("relays[{}].mastodon.access_token", i),
                &relay.mastodon.access_token,
            )?;

            let field = format!("relays[{}].twitter.screen_name", i);
            require(&field, &relay.twitter.screen_name)?;
            if relay.twitter.screen_name.starts_with('@') {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "screen names are matched without the leading '@'".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()).into());
    }
    Ok(())
}

/// Resolve the configuration file path.
///
/// Order: explicit path, `TOOTRELAY_CONFIG`, `./config.toml` when present,
/// then the XDG config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("TOOTRELAY_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let local = PathBuf::from("config.toml");
    if local.exists() {
        return Ok(local);
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("toot-relay").join("config.toml"))
}
