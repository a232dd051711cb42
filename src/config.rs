use std::net::SocketAddr;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

/// One year; longer lifetimes are refused at startup.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    /// Tokens carry no `exp` claim when unset.
    pub ttl_minutes: Option<i64>,
}

/// Which credential store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?} (expected postgres or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres store");
        }

        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        let secret = SecretString::from(secret);
        if secret.expose_secret().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(v) => {
                let minutes = v
                    .parse::<i64>()
                    .with_context(|| format!("JWT_TTL_MINUTES is not a number: {v:?}"))?;
                if minutes <= 0 {
                    anyhow::bail!("JWT_TTL_MINUTES must be positive");
                }
                if minutes > MAX_TTL_MINUTES {
                    anyhow::bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}");
                }
                Some(minutes)
            }
            None => None,
        };

        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a port: {v:?}"))?,
            None => 3000,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v:?}"))?,
            None => 10,
        };

        Ok(Self {
            store,
            database_url,
            db_max_connections,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt: JwtConfig { secret, ttl_minutes },
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
