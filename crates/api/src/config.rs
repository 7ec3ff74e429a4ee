use std::fmt::Display;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long shutdown waits for the event logger to drain.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read `HOST` (`0.0.0.0`), `PORT` (`3000`), `CORS_ORIGINS`
    /// (comma-separated, `http://localhost:5173`), `REQUEST_TIMEOUT_SECS`
    /// (`30`), `SHUTDOWN_TIMEOUT_SECS` (`30`) and the JWT settings.
    ///
    /// # Panics
    ///
    /// On any value that does not parse, and see [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.into()),
            ),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
        }
    }
}

/// Connection settings for the optional PostgreSQL store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// `None` when `DATABASE_URL` is unset or blank, in which case the
    /// server keeps forms in memory.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())?;
        Some(Self {
            url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", hsseq_db::DEFAULT_MAX_CONNECTIONS),
        })
    }
}

/// Parse `key` if set, else `default`. Panics on an unparseable value.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key}={raw:?} is invalid: {e}")),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        let port: u16 = env_or("HSSEQ_TEST_SURELY_UNSET_VARIABLE", 8080);
        assert_eq!(port, 8080);
    }
}
