use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Live sessions kept in memory before the least recently touched is evicted.
    pub max_sessions: usize,
    /// Idle minutes after which a session is dropped.
    pub session_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_sessions: 1000,
            session_ttl_minutes: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_sessions: parse_env("MAX_SESSIONS", defaults.max_sessions)
                .context("MAX_SESSIONS must be a positive integer")?,
            session_ttl_minutes: parse_env("SESSION_TTL_MINUTES", defaults.session_ttl_minutes)
                .context("SESSION_TTL_MINUTES must be a whole number of minutes")?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}
