use std::{
    env,
    net::{IpAddr, SocketAddr},
};

use anyhow::Context;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings read from the environment (after `.env`, if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// HS256 key used to verify bearer tokens.
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .context("JWT_SECRET is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a port number: {raw}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("APP_HOST is not an IP address: {}", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
