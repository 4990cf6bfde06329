//! Configuration
//!
//! Typed configuration loaded from a JSON5 file, with environment variable
//! overrides for secrets and deployment-specific URLs.

use crate::voice::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "STENOTYPE_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required config value: {0}")]
    Missing(&'static str),
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub account: AccountConfig,
    pub server: ServerConfig,
    pub call: CallConfig,
    pub room: RoomConfig,
    pub logging: LoggingConfig,
}

/// REST account credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountConfig {
    /// Account SID
    pub sid: String,
    /// Auth token, also the webhook signing key
    pub token: String,
    /// Verified outgoing caller ID
    pub caller_id: String,
    /// REST API root, including the API version
    pub api_base_url: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            sid: String::new(),
            token: String::new(),
            caller_id: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Webhook server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Public base URL the provider reaches this server at
    pub public_url: String,
    /// Reject webhooks without a valid signature
    pub verify_signatures: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 1234,
            public_url: String::new(),
            verify_signatures: true,
        }
    }
}

impl ServerConfig {
    /// Public URL for a server path
    pub fn public_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Outbound call and call-script settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallConfig {
    /// Number dialed when none is given
    pub default_callee: String,
    /// Document a call is redirected to when it is ended
    pub hangup_url: Option<String>,
    /// Spoken before recording starts
    pub greeting: String,
    /// Maximum recording length in seconds
    pub max_length: u32,
    /// Seconds of silence that end a recording
    pub timeout: u32,
    pub play_beep: bool,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            default_callee: String::new(),
            hangup_url: None,
            greeting: "Recording. Speak after the tone.".to_string(),
            max_length: 20,
            timeout: 30,
            play_beep: false,
        }
    }
}

/// Chat room transcriptions are relayed into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomConfig {
    /// Incoming-webhook URL; messages are only logged when unset
    pub webhook_url: Option<String>,
    pub room: String,
    pub nick: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            room: String::new(),
            nick: "stenotype".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

/// Logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter directive (error, warn, info, debug, trace, or per-target)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Check the values needed to talk to the REST API
    pub fn validate_account(&self) -> Result<(), ConfigError> {
        if self.account.sid.is_empty() {
            return Err(ConfigError::Missing("account.sid"));
        }
        if self.account.token.is_empty() {
            return Err(ConfigError::Missing("account.token"));
        }
        Ok(())
    }

    /// Check the values needed to place calls
    pub fn validate_dialer(&self) -> Result<(), ConfigError> {
        self.validate_account()?;
        if self.account.caller_id.is_empty() {
            return Err(ConfigError::Missing("account.callerId"));
        }
        if self.server.public_url.is_empty() {
            return Err(ConfigError::Missing("server.publicUrl"));
        }
        Ok(())
    }

    /// Check the values needed to run the webhook server
    pub fn validate_server(&self) -> Result<(), ConfigError> {
        self.validate_dialer()?;
        if self.server.port == 0 {
            return Err(ConfigError::Missing("server.port"));
        }
        Ok(())
    }

    /// URL of the call script served by the webhook server
    pub fn call_script_url(&self) -> String {
        self.server.public_endpoint("twiml")
    }

    /// URL the provider posts transcriptions to
    pub fn transcription_url(&self) -> String {
        self.server.public_endpoint("transcription")
    }

    /// URL of the hangup document
    pub fn hangup_url(&self) -> String {
        self.call
            .hangup_url
            .clone()
            .unwrap_or_else(|| self.server.public_endpoint("hangup"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(sid) = get("STENOTYPE_ACCOUNT_SID") {
            self.account.sid = sid;
        }
        if let Some(token) = get("STENOTYPE_AUTH_TOKEN") {
            self.account.token = token;
        }
        if let Some(url) = get("STENOTYPE_PUBLIC_URL") {
            self.server.public_url = url;
        }
        if let Some(url) = get("STENOTYPE_ROOM_WEBHOOK") {
            self.room.webhook_url = Some(url);
        }
    }
}

/// Resolve the config file path: explicit flag, then `STENOTYPE_CONFIG`,
/// then the platform config directory.
pub fn get_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stenotype")
        .join("config.json5")
}

/// Parse a config file without environment overrides. A missing file yields
/// the defaults.
pub fn load_config_uncached(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)?;
    json5::from_str::<Config>(&raw).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load the config file and apply environment overrides
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = get_config_path(explicit);
    let mut config = load_config_uncached(&path)?;
    config.apply_env_overrides();
    Ok(config)
}
