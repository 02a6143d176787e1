//! Chain registry lookups and chain list normalization.
//!
//! Raw per-chain records are filtered down to chains the account has
//! actually used and enriched with registry display metadata.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;

use crate::models::{AddressBalance, AggregateBalance, ChainBalance, ChainMeta, ChainWithBalance};

/// Resolves chain identifiers to display metadata.
pub trait ChainRegistry: Send + Sync {
    /// Looks up a chain by its numeric community id.
    fn resolve_by_id(&self, id: u64) -> Option<ChainMeta>;

    /// Looks up a chain by its server-assigned id.
    fn resolve_by_server_id(&self, server_id: &str) -> Option<ChainMeta>;
}

/// Registry backed by a fixed list of chains.
#[derive(Debug, Clone, Default)]
pub struct StaticChainRegistry {
    by_id: HashMap<u64, ChainMeta>,
    by_server_id: HashMap<String, ChainMeta>,
}

impl StaticChainRegistry {
    /// Builds a registry from a list of chains. Later duplicates win.
    pub fn from_chains(chains: impl IntoIterator<Item = ChainMeta>) -> Self {
        let mut registry = Self::default();
        for chain in chains {
            registry
                .by_server_id
                .insert(chain.server_id.clone(), chain.clone());
            registry.by_id.insert(chain.id, chain);
        }
        registry
    }

    /// Loads a registry from a JSON array of [`ChainMeta`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::BalanceError::Io(format!("failed to read {}: {e}", path.display()))
        })?;
        let chains: Vec<ChainMeta> = serde_json::from_str(&contents)?;
        Ok(Self::from_chains(chains))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ChainRegistry for StaticChainRegistry {
    fn resolve_by_id(&self, id: u64) -> Option<ChainMeta> {
        self.by_id.get(&id).cloned()
    }

    fn resolve_by_server_id(&self, server_id: &str) -> Option<ChainMeta> {
        self.by_server_id.get(server_id).cloned()
    }
}

/// Converts a raw record into its display form, or `None` if the account
/// has never been active on the chain.
fn format_chain(item: &ChainWithBalance, registry: &dyn ChainRegistry) -> Option<ChainBalance> {
    let born_at = item.born_at?;
    let meta = registry.resolve_by_id(item.community_id);

    let (logo, white_logo) = match meta {
        Some(meta) => (meta.logo, meta.white_logo),
        None => (item.logo_url.clone(), None),
    };

    Some(ChainBalance {
        server_id: item.id.clone(),
        community_id: item.community_id,
        name: item.name.clone(),
        usd_value: item.usd_value,
        born_at,
        logo,
        white_logo,
    })
}

/// Normalizes a raw chain list, dropping records with no `born_at` and
/// preserving input order.
pub fn normalize_chain_list(
    chain_list: &[ChainWithBalance],
    registry: &dyn ChainRegistry,
) -> Vec<ChainBalance> {
    chain_list
        .iter()
        .filter_map(|item| format_chain(item, registry))
        .collect()
}

/// Normalizes a full balance payload. The total is taken as reported.
pub fn normalize_address_balance(
    balance: &AddressBalance,
    registry: &dyn ChainRegistry,
) -> AggregateBalance {
    AggregateBalance {
        total_usd_value: balance.total_usd_value,
        chains: normalize_chain_list(&balance.chain_list, registry),
    }
}

/// Keeps only chains with a strictly positive USD value, preserving order.
pub fn filter_chain_with_balance(chains: &[ChainBalance]) -> Vec<ChainBalance> {
    chains
        .iter()
        .filter(|chain| chain.usd_value > Decimal::ZERO)
        .cloned()
        .collect()
}

/// Resolves server chain ids to display names. Unknown ids map to `None`
/// so positions line up with the input.
pub fn resolve_chain_names(
    server_ids: &[String],
    registry: &dyn ChainRegistry,
) -> Vec<Option<String>> {
    server_ids
        .iter()
        .map(|id| registry.resolve_by_server_id(id).map(|chain| chain.name))
        .collect()
}
