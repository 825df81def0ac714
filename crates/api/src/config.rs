use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the Quire HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// PostgreSQL connection string. Pages are kept in memory when unset.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read settings from the process environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`         | unset (in-memory store)    |
    ///
    /// # Panics
    ///
    /// Panics on malformed numeric values or a missing `JWT_SECRET`, so that
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        Self {
            host: env_string("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: env_parsed("PORT", DEFAULT_PORT),
            cors_origins: parse_origins(
                env_string("CORS_ORIGINS")
                    .as_deref()
                    .unwrap_or(DEFAULT_CORS_ORIGINS),
            ),
            request_timeout_secs: env_parsed(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            database_url: env_string("DATABASE_URL"),
            jwt: JwtConfig::from_env(),
        }
    }

    /// Socket address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip = IpAddr::from_str(self.host.trim())?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// A set, non-blank environment variable.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} has invalid value '{raw}': {e}")),
        None => default,
    }
}

/// Split a comma-separated origin list, dropping blanks and duplicates.
fn parse_origins(raw: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}
