//! Balance models.
//!
//! Raw records arrive from the cache store or the balance service; display
//! records are what the controller publishes after normalization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-chain balance record as produced by the balance service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChainWithBalance {
    /// Server-assigned chain identifier (e.g., "eth", "bsc").
    pub id: String,
    /// Numeric chain identifier used by the chain registry.
    pub community_id: u64,
    pub name: String,
    /// Fallback logo when the registry has no entry for the chain.
    #[serde(default)]
    pub logo_url: String,
    pub usd_value: Decimal,
    /// Unix timestamp of the account's first activity on this chain.
    /// `None` means the account never touched the chain.
    pub born_at: Option<i64>,
}

/// Total balance payload shared by the cache store and the balance service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddressBalance {
    pub total_usd_value: Decimal,
    #[serde(default)]
    pub chain_list: Vec<ChainWithBalance>,
}

/// Display metadata resolved from the chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainMeta {
    /// Numeric chain identifier (matches [`ChainWithBalance::community_id`]).
    pub id: u64,
    /// Server-assigned identifier (matches [`ChainWithBalance::id`]).
    pub server_id: String,
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub white_logo: Option<String>,
}

/// Display-ready chain balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainBalance {
    pub server_id: String,
    pub community_id: u64,
    pub name: String,
    pub usd_value: Decimal,
    /// First-activity timestamp; always present once normalized.
    pub born_at: i64,
    pub logo: String,
    pub white_logo: Option<String>,
}

/// Account total plus its normalized per-chain breakdown.
///
/// `total_usd_value` is reported by the source and is not recomputed from
/// `chains`; the two can diverge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBalance {
    pub total_usd_value: Decimal,
    pub chains: Vec<ChainBalance>,
}
