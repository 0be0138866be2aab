use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 5;
const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 1;

/// Runtime settings, read once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub jwt_secret: String,
    pub media_root: PathBuf,
    pub access_token_ttl: time::Duration,
    pub refresh_token_ttl: time::Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned())
            .parse::<SocketAddr>()
            .context("BIND_ADDRESS must be a socket address")?;
        let media_root = PathBuf::from(
            lookup("MEDIA_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_owned()),
        );
        let access_minutes = parse_or(
            lookup("ACCESS_TOKEN_MINUTES"),
            DEFAULT_ACCESS_TOKEN_MINUTES,
        )
        .context("ACCESS_TOKEN_MINUTES must be an integer")?;
        let refresh_days = parse_or(lookup("REFRESH_TOKEN_DAYS"), DEFAULT_REFRESH_TOKEN_DAYS)
            .context("REFRESH_TOKEN_DAYS must be an integer")?;

        Ok(Self {
            database_url,
            bind_address,
            jwt_secret,
            media_root,
            access_token_ttl: time::Duration::minutes(access_minutes),
            refresh_token_ttl: time::Duration::days(refresh_days),
        })
    }

    /// Settings for a local instance; used by tests and tooling.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3001)),
            jwt_secret: jwt_secret.into(),
            media_root: DEFAULT_MEDIA_ROOT.into(),
            access_token_ttl: time::Duration::minutes(DEFAULT_ACCESS_TOKEN_MINUTES),
            refresh_token_ttl: time::Duration::days(DEFAULT_REFRESH_TOKEN_DAYS),
        }
    }
}

fn parse_or(value: Option<String>, default: i64) -> Result<i64> {
    match value {
        Some(value) => Ok(value.trim().parse::<i64>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://ads.db"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.port(), 3001);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.access_token_ttl, time::Duration::minutes(5));
        assert_eq!(config.refresh_token_ttl, time::Duration::days(1));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite://ads.db")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_bad_token_lifetime() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://ads.db"),
            ("JWT_SECRET", "secret"),
            ("ACCESS_TOKEN_MINUTES", "soon"),
        ]));
        assert!(result.is_err());
    }
}
