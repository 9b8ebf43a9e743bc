//! Configuration types and loading.
//!
//! Config is loaded from an optional JSON file (e.g. `./yoyaku.json`) and environment.
//! LINE credentials come from `LINE_CHANNEL_SECRET` / `LINE_CHANNEL_ACCESS_TOKEN`,
//! which take precedence over the file. Both are required before the gateway starts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const CHANNEL_SECRET_ENV: &str = "LINE_CHANNEL_SECRET";
pub const CHANNEL_ACCESS_TOKEN_ENV: &str = "LINE_CHANNEL_ACCESS_TOKEN";
const CONFIG_PATH_ENV: &str = "YOYAKU_CONFIG_PATH";
const PORT_ENV: &str = "PORT";

pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_LINE_DATA_API_BASE: &str = "https://api-data.line.me";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (LINE).
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8000). Overridden by the PORT env var.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; LINE must be able to reach the callback).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub line: LineChannelConfig,
}

/// LINE Messaging API channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    /// Channel secret used to verify X-Line-Signature. Overridden by LINE_CHANNEL_SECRET.
    pub channel_secret: Option<String>,
    /// Long-lived channel access token. Overridden by LINE_CHANNEL_ACCESS_TOKEN.
    pub channel_access_token: Option<String>,
    /// Messaging API base URL (default https://api.line.me).
    pub api_base: Option<String>,
    /// Content API base URL (default https://api-data.line.me).
    pub data_api_base: Option<String>,
    /// Download media content before answering image/video/audio messages. The bytes are
    /// discarded; this only reproduces the extra API call. Default: false.
    #[serde(default)]
    pub fetch_media_content: bool,
}

/// Channel secret and access token, resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct LineCredentials {
    pub channel_secret: String,
    pub channel_access_token: String,
}

impl fmt::Debug for LineCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCredentials")
            .field("channel_secret", &"<redacted>")
            .field("channel_access_token", &"<redacted>")
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolve the channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_channel_secret(config: &Config) -> Option<String> {
    resolve_channel_secret_with(config, process_env)
}

fn resolve_channel_secret_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    non_empty(env(CHANNEL_SECRET_ENV).as_deref())
        .or_else(|| non_empty(config.channels.line.channel_secret.as_deref()))
}

fn resolve_channel_access_token_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    non_empty(env(CHANNEL_ACCESS_TOKEN_ENV).as_deref())
        .or_else(|| non_empty(config.channels.line.channel_access_token.as_deref()))
}

/// Resolve both LINE credentials. Fails when either is missing or blank; the caller is
/// expected to abort startup.
pub fn resolve_line_credentials(config: &Config) -> Result<LineCredentials> {
    resolve_line_credentials_with(config, process_env)
}

fn resolve_line_credentials_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LineCredentials> {
    let channel_secret = resolve_channel_secret_with(config, &env).with_context(|| {
        format!("specify {} as environment variable", CHANNEL_SECRET_ENV)
    })?;
    let channel_access_token = resolve_channel_access_token_with(config, &env).with_context(|| {
        format!("specify {} as environment variable", CHANNEL_ACCESS_TOKEN_ENV)
    })?;
    Ok(LineCredentials {
        channel_secret,
        channel_access_token,
    })
}

/// Resolve the listen port: env PORT overrides config. An unparsable PORT is an error.
pub fn resolve_port(config: &Config) -> Result<u16> {
    resolve_port_with(config, process_env)
}

fn resolve_port_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Result<u16> {
    match non_empty(env(PORT_ENV).as_deref()) {
        Some(p) => p
            .parse::<u16>()
            .with_context(|| format!("parsing {}={}", PORT_ENV, p)),
        None => Ok(config.gateway.port),
    }
}

/// Messaging API base URL without a trailing slash.
pub fn resolve_api_base(config: &Config) -> String {
    non_empty(config.channels.line.api_base.as_deref())
        .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Content API base URL without a trailing slash.
pub fn resolve_data_api_base(config: &Config) -> String {
    non_empty(config.channels.line.data_api_base.as_deref())
        .unwrap_or_else(|| DEFAULT_LINE_DATA_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("yoyaku.json"))
}

/// Load config from the given path, YOYAKU_CONFIG_PATH, or ./yoyaku.json. Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8000);
        assert_eq!(g.bind, "0.0.0.0");
    }

    #[test]
    fn parses_camel_case_file() {
        let config: Config = serde_json::from_str(
            r#"{
                "gateway": { "port": 9000 },
                "channels": { "line": {
                    "channelSecret": "s",
                    "channelAccessToken": "t",
                    "apiBase": "http://127.0.0.1:1/",
                    "fetchMediaContent": true
                } }
            }"#,
        )
        .expect("parse config");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, "0.0.0.0");
        assert!(config.channels.line.fetch_media_content);
        assert_eq!(resolve_api_base(&config), "http://127.0.0.1:1");
        assert_eq!(resolve_data_api_base(&config), DEFAULT_LINE_DATA_API_BASE);
    }

    #[test]
    fn credentials_from_env() {
        let env = env_of(&[
            (CHANNEL_SECRET_ENV, "secret"),
            (CHANNEL_ACCESS_TOKEN_ENV, " token "),
        ]);
        let creds = resolve_line_credentials_with(&Config::default(), env).expect("credentials");
        assert_eq!(creds.channel_secret, "secret");
        assert_eq!(creds.channel_access_token, "token");
    }

    #[test]
    fn env_overrides_config_file() {
        let mut config = Config::default();
        config.channels.line.channel_secret = Some("from-file".to_string());
        config.channels.line.channel_access_token = Some("file-token".to_string());
        let env = env_of(&[(CHANNEL_SECRET_ENV, "from-env")]);
        let creds = resolve_line_credentials_with(&config, env).expect("credentials");
        assert_eq!(creds.channel_secret, "from-env");
        assert_eq!(creds.channel_access_token, "file-token");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let env = env_of(&[(CHANNEL_ACCESS_TOKEN_ENV, "token")]);
        let err = resolve_line_credentials_with(&Config::default(), env).unwrap_err();
        assert!(err.to_string().contains(CHANNEL_SECRET_ENV));
    }

    #[test]
    fn blank_token_is_an_error() {
        let env = env_of(&[(CHANNEL_SECRET_ENV, "secret"), (CHANNEL_ACCESS_TOKEN_ENV, "   ")]);
        let err = resolve_line_credentials_with(&Config::default(), env).unwrap_err();
        assert!(err.to_string().contains(CHANNEL_ACCESS_TOKEN_ENV));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = LineCredentials {
            channel_secret: "very-secret".to_string(),
            channel_access_token: "very-token".to_string(),
        };
        let out = format!("{:?}", creds);
        assert!(!out.contains("very-secret"));
        assert!(!out.contains("very-token"));
    }

    #[test]
    fn port_env_overrides_config() {
        let config = Config::default();
        assert_eq!(resolve_port_with(&config, env_of(&[])).unwrap(), 8000);
        assert_eq!(
            resolve_port_with(&config, env_of(&[(PORT_ENV, "5000")])).unwrap(),
            5000
        );
        assert!(resolve_port_with(&config, env_of(&[(PORT_ENV, "web")])).is_err());
    }
}
