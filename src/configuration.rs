use anyhow::{Context, Result};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Any origin is allowed when unset.
    pub cors_allowed_origin: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).filter(|v| !v.is_empty()).with_context(|| format!("{key} must be set"));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 5)?,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
