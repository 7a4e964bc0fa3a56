use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use tracing::info;

use petition_api::session::{DEFAULT_TTL_SECS, SessionSettings};

/// Session secrets that must never reach a running server.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "leyndarmál", "secret"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub sessions: SessionSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let secret = env::var("PETITION_SESSION_SECRET").unwrap_or_default();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            bail!("PETITION_SESSION_SECRET is unset or still a placeholder; set it in the environment or .env");
        }

        let ttl_secs: i64 = try_load("PETITION_SESSION_TTL_SECS", &DEFAULT_TTL_SECS.to_string())?;
        if ttl_secs <= 0 {
            bail!("PETITION_SESSION_TTL_SECS must be positive, got {ttl_secs}");
        }

        Ok(Self {
            host: try_load("PETITION_HOST", "0.0.0.0")?,
            port: try_load("PETITION_PORT", "3000")?,
            db_path: try_load("PETITION_DB_PATH", "petition.db")?,
            sessions: SessionSettings {
                secret,
                ttl: time::Duration::seconds(ttl_secs),
                secure_cookie: try_load("PETITION_SECURE_COOKIE", "false")?,
            },
        })
    }
}

/// Read `key` from the environment, falling back to `default`, and parse it.
pub fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}
