//! Server configuration loaded from environment variables.
//!
//! `DATABASE_PATH` and `SECRET_KEY` have no defaults; the server refuses to
//! start without them. Everything else falls back to a development value.

use std::net::SocketAddr;
use std::path::PathBuf;

use sitor_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_TOKEN_TTL_HOURS};
use thiserror::Error;

/// Origins allowed by CORS when `CORS_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,https://xeroon.xyz";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// SQLite database file.
    /// Env: `DATABASE_PATH` (required)
    pub database_path: PathBuf,

    /// HMAC secret for bearer tokens.
    /// Env: `SECRET_KEY` (required)
    pub secret_key: String,

    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Env: `CORS_ORIGINS` (comma separated)
    pub cors_origins: Vec<String>,

    /// Lifetime of issued tokens.
    /// Env: `TOKEN_TTL_HOURS`
    /// Default: `72`
    pub token_ttl_hours: i64,
}

// Keeps the secret out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_path", &self.database_path)
            .field("secret_key", &"<redacted>")
            .field("http_addr", &self.http_addr)
            .field("cors_origins", &self.cors_origins)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl ServerConfig {
    /// Config with development defaults for everything optional.
    pub fn new(database_path: impl Into<PathBuf>, secret_key: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            secret_key: secret_key.into(),
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = lookup("DATABASE_PATH")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_PATH"))?;
        let secret_key = lookup("SECRET_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let mut config = Self::new(database_path, secret_key);

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(origins) = lookup("CORS_ORIGINS") {
            let parsed = parse_origins(&origins);
            if parsed.is_empty() {
                tracing::warn!("Empty CORS_ORIGINS, using default");
            } else {
                config.cors_origins = parsed;
            }
        }

        if let Some(val) = lookup("TOKEN_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours > 0 => config.token_ttl_hours = hours,
                _ => tracing::warn!(value = %val, "Invalid TOKEN_TTL_HOURS, using default"),
            }
        }

        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
