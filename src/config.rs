//! Application configuration loaded from environment variables.
//!
//! - `WALLET_BALANCE_API_URL` — base URL of the balance service
//! - `WALLET_API_LEVEL` — capability level advertised for this session
//! - `WALLET_BALANCE_CACHE_TTL_SECS` — how long cached balances stay fresh
//! - `WALLET_CHAIN_REGISTRY` — optional path to a JSON chain list

use std::path::PathBuf;
use std::time::Duration;

/// Default balance service endpoint.
const DEFAULT_API_URL: &str = "http://localhost:8787";

/// Default cache lifetime in seconds.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub cache: CacheConfig,
    /// Chain registry file; an empty registry is used when absent.
    pub chain_registry: Option<PathBuf>,
}

/// Remote balance service configuration values.
#[derive(Debug)]
pub struct ServiceConfig {
    pub api_url: String,
    pub api_level: i64,
}

#[derive(Debug)]
pub struct CacheConfig {
    pub ttl: Duration,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`BalanceError::Config`](crate::BalanceError::Config) if
/// `WALLET_API_LEVEL` or `WALLET_BALANCE_CACHE_TTL_SECS` is not an integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let api_url = non_empty_var("WALLET_BALANCE_API_URL")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let api_level = match non_empty_var("WALLET_API_LEVEL") {
        Some(raw) => raw.parse::<i64>().map_err(|e| {
            crate::BalanceError::Config(format!("WALLET_API_LEVEL is not an integer: {e}"))
        })?,
        None => 0,
    };

    let ttl_secs = match non_empty_var("WALLET_BALANCE_CACHE_TTL_SECS") {
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            crate::BalanceError::Config(format!(
                "WALLET_BALANCE_CACHE_TTL_SECS is not a number of seconds: {e}"
            ))
        })?,
        None => DEFAULT_CACHE_TTL_SECS,
    };

    Ok(AppConfig {
        service: ServiceConfig { api_url, api_level },
        cache: CacheConfig {
            ttl: Duration::from_secs(ttl_secs),
        },
        chain_registry: non_empty_var("WALLET_CHAIN_REGISTRY").map(PathBuf::from),
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
