//! Process configuration, read from the environment.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_DB_PATH: &str = "db.json";

pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_PATH: &str = "ACCOUNTD_DB";

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. A missing or blank
    /// `JWT_SECRET` is an error: the service never runs with a guessable key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = match lookup(ENV_JWT_SECRET) {
            Some(s) if !s.trim().is_empty() => s,
            _ => bail!(
                "{ENV_JWT_SECRET} is not set.\n\
                 Fix: export {ENV_JWT_SECRET}=<random secret> before starting the service."
            ),
        };

        let port = match lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{p}'"))?,
            None => DEFAULT_PORT,
        };

        let host = lookup(ENV_HOST)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let db_path = lookup(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
        })
    }
}
