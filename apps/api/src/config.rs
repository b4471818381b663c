use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::auth::oauth::OAuthConfig;
use crate::chat::orchestrator::SessionSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub resume_api_url: String,
    /// Session identifiers go to Redis when set, process memory otherwise.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub submit_delay_ms: u64,
    pub history_window: usize,
    pub remote_timeout_secs: u64,
    pub oauth: OAuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            resume_api_url: require_env("RESUME_API_URL")?,
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            submit_delay_ms: parse_env("SUBMIT_DELAY_MS", 1000)?,
            history_window: parse_env("HISTORY_WINDOW", 20)?,
            remote_timeout_secs: parse_env("REMOTE_TIMEOUT_SECS", 120)?,
            oauth: OAuthConfig {
                google_client_id: optional_env("GOOGLE_CLIENT_ID"),
                apple_client_id: optional_env("APPLE_CLIENT_ID"),
                linkedin_client_id: optional_env("LINKEDIN_CLIENT_ID"),
            },
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            history_window: self.history_window,
            submit_delay: Duration::from_millis(self.submit_delay_ms),
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
