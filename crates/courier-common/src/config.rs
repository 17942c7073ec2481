//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: legacy bridge vars > `COURIER__*` env vars > .env file > courier.toml > defaults
//!
//! The loaded [`AppConfig`] is an owned value. It is validated once at startup and
//! then handed to the router state; nothing in the request path reads ambient config.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::CourierError;

/// Environment variable names understood by earlier deployments of the bridge.
pub const LEGACY_PUBLIC_KEY_VAR: &str = "DISCORD_PUBLIC_KEY";
pub const LEGACY_FORWARD_URL_VAR: &str = "N8N_WEBHOOK_URL";
pub const LEGACY_PORT_VAR: &str = "PORT";

/// Length of a hex-encoded Ed25519 public key.
const PUBLIC_KEY_HEX_LEN: usize = 64;

/// Load configuration from `.env`, an optional config file, and the environment.
///
/// `path` names an explicit config file (required to exist). Without it,
/// `courier.{toml,yaml,json}` in the working directory is used if present.
pub fn load(path: Option<&str>) -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let file = match path {
        Some(p) => config::File::with_name(p).required(true),
        None => config::File::with_name("courier").required(false),
    };

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.max_body_bytes", 1_048_576)? // 1 MiB
        .set_default("discord.public_key", "")?
        .set_default("forward.required", true)?
        .set_default("forward.timeout_secs", 5)?
        .set_default("log.format", "pretty")?
        .set_default("log.filter", "courier=info,tower_http=info")?
        .add_source(file)
        // Environment variables (COURIER__SERVER__PORT, COURIER__FORWARD__URL, etc.)
        .add_source(
            config::Environment::with_prefix("COURIER")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("discord.public_key", std::env::var(LEGACY_PUBLIC_KEY_VAR).ok())?
        .set_override_option("forward.url", std::env::var(LEGACY_FORWARD_URL_VAR).ok())?
        .set_override_option("server.port", std::env::var(LEGACY_PORT_VAR).ok())?
        .build()?;

    cfg.try_deserialize()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub discord: DiscordConfig,
    pub forward: ForwardConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on inbound interaction bodies.
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    /// Application public key, hex-encoded (64 chars). Maps to `DISCORD_PUBLIC_KEY`.
    pub public_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForwardConfig {
    /// Absolute URL of the downstream automation webhook. Maps to `N8N_WEBHOOK_URL`.
    #[serde(default)]
    pub url: Option<String>,
    /// Refuse to start when `url` is unset. With `false` the bridge still answers
    /// the platform but skips forwarding.
    pub required: bool,
    pub timeout_secs: u64,
    /// Static headers attached to every downstream POST (e.g. a webhook auth token).
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The downstream URL, if any. Blank values count as unset.
    pub fn target_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl AppConfig {
    /// Check every value the bridge needs before it starts accepting traffic.
    pub fn validate(&self) -> Result<(), CourierError> {
        let key = self.discord.public_key.trim();
        if key.is_empty() {
            return Err(CourierError::configuration(format!(
                "discord.public_key is not set (set {LEGACY_PUBLIC_KEY_VAR} or COURIER__DISCORD__PUBLIC_KEY)"
            )));
        }
        if key.len() != PUBLIC_KEY_HEX_LEN || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CourierError::configuration(
                "discord.public_key must be 64 hex characters",
            ));
        }

        match self.forward.target_url() {
            Some(raw) => {
                let parsed = url::Url::parse(raw).map_err(|e| {
                    CourierError::configuration(format!("forward.url is not a valid URL: {e}"))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(CourierError::configuration(format!(
                        "forward.url must use http or https, got '{}'",
                        parsed.scheme()
                    )));
                }
            }
            _ if self.forward.required => {
                return Err(CourierError::configuration(format!(
                    "forward.url is not set (set {LEGACY_FORWARD_URL_VAR} or COURIER__FORWARD__URL, \
                     or forward.required = false to run without forwarding)"
                )));
            }
            _ => {}
        }

        if self.forward.timeout_secs == 0 {
            return Err(CourierError::configuration("forward.timeout_secs must be positive"));
        }
        if self.server.max_body_bytes == 0 {
            return Err(CourierError::configuration("server.max_body_bytes must be positive"));
        }
        Ok(())
    }
}
