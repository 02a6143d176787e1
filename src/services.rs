//! Collaborator contracts used by the balance controller.
//!
//! The cache store, remote balance service and capability config are all
//! opaque async services; the controller only relies on the traits below.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::AddressBalance;

/// Service error code meaning "some chains could not be reached".
pub const PARTIAL_FAILURE_CODE: i64 = 2;

/// Failure reported by the remote balance service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The total was computed but the listed chains were unreachable.
    #[error("balance unavailable on {} chain(s)", chain_ids.len())]
    ChainsUnavailable { chain_ids: Vec<String> },

    /// The service returned a structured error other than a partial failure.
    #[error("balance service rejected request with code {code}")]
    Rejected { code: i64, message: Option<String> },

    /// The error payload could not be parsed.
    #[error("malformed error payload: {0}")]
    Malformed(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Wire shape of a balance service error body.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error_code: i64,
    #[serde(default)]
    err_chain_ids: Vec<String>,
    #[serde(default)]
    error_msg: Option<String>,
}

impl RemoteError {
    /// Parses a service error body such as
    /// `{"error_code":2,"err_chain_ids":["eth","bsc"]}`.
    pub fn from_payload(payload: &str) -> Self {
        match serde_json::from_str::<ErrorPayload>(payload) {
            Ok(body) if body.error_code == PARTIAL_FAILURE_CODE => Self::ChainsUnavailable {
                chain_ids: body.err_chain_ids,
            },
            Ok(body) => Self::Rejected {
                code: body.error_code,
                message: body.error_msg,
            },
            Err(e) => Self::Malformed(format!("{e}: {payload}")),
        }
    }
}

/// Local balance cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the cached balance for an account, if any.
    async fn get_address_cache_balance(&self, account: &str)
    -> crate::Result<Option<AddressBalance>>;

    /// Reports whether the cached balance for an account is stale.
    async fn is_address_balance_expired(&self, account: &str) -> crate::Result<bool>;
}

/// Remote valuation service.
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Fetches the account's total and per-chain balances. `force` asks the
    /// service to bypass its own caches.
    async fn get_address_balance(
        &self,
        account: &str,
        force: bool,
    ) -> Result<AddressBalance, RemoteError>;
}

/// Source of the session's API capability level.
#[async_trait]
pub trait CapabilityConfig: Send + Sync {
    async fn api_level(&self) -> crate::Result<i64>;
}
