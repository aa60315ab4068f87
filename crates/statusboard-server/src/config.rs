use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PATH: &str = "statusboard.db";

/// Server settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `:memory:` keeps everything in RAM for the life of the process.
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("STATUSBOARD_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = match lookup("STATUSBOARD_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid port '{}'", raw))?,
            None => DEFAULT_PORT,
        };
        let db_path = lookup("STATUSBOARD_DB_PATH")
            .unwrap_or_else(|| DEFAULT_DB_PATH.into())
            .into();

        Ok(Self {
            host,
            port,
            db_path,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
