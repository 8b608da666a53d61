use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

use crate::store::StoreKind;

pub struct Config {
    pub port: u16,
    pub store_backend: StoreKind,
    pub redis_url: String,
    /// Swallow store failures on write paths and report success, list returns empty.
    pub degrade_on_storage_error: bool,
    pub cors_max_age_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        let redis_url: String = try_load("REDIS_URL", "redis://redis:6379");

        Self {
            port: try_load("RUST_PORT", "1111"),
            store_backend: try_load("STORE_BACKEND", "memory"),
            redis_url: match read_secret("REDIS_PASSWORD") {
                Some(password) => with_password(&redis_url, &password),
                None => redis_url,
            },
            degrade_on_storage_error: try_load("DEGRADE_ON_STORAGE_ERROR", "true"),
            cors_max_age_secs: try_load("CORS_MAX_AGE_SECS", "3600"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            store_backend: StoreKind::Memory,
            redis_url: "redis://redis:6379".to_string(),
            degrade_on_storage_error: true,
            cors_max_age_secs: 60 * 60,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Secrets are optional here, a missing file just means no auth.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

fn with_password(redis_url: &str, password: &str) -> String {
    match redis_url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('@') => format!("{scheme}://:{password}@{rest}"),
        _ => redis_url.to_string(),
    }
}
