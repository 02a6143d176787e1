//! Emitted controller state and fetch outcomes.

use rust_decimal::Decimal;

use crate::chain::filter_chain_with_balance;
use crate::models::{AggregateBalance, ChainBalance};

/// Capability levels at or above this value stop the controller from
/// calling the balance service on its own.
pub const EXTERNALLY_DRIVEN_MIN_LEVEL: i64 = 2;

/// How balances reach the controller for one fetch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// The controller calls the balance service itself.
    ClientDriven,
    /// Balances are refreshed out of band; the controller only reads the cache.
    ExternallyDriven,
}

impl FetchStrategy {
    pub fn from_level(level: i64) -> Self {
        if level < EXTERNALLY_DRIVEN_MIN_LEVEL {
            Self::ClientDriven
        } else {
            Self::ExternallyDriven
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientDriven => "client_driven",
            Self::ExternallyDriven => "externally_driven",
        }
    }
}

/// Result of a balance fetch that reached a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A full balance was obtained from the cache or the network.
    Success(AggregateBalance),
    /// The service could not reach some chains. Holds their display names in
    /// the order reported; unknown chains are `None`.
    PartialFailure(Vec<Option<String>>),
    /// The request failed outright. Previously held data is kept.
    HardFailure,
}

impl FetchOutcome {
    /// Applies a network result to the state.
    pub(crate) fn apply_to(&self, state: &mut ControllerState) {
        state.loading = false;
        match self {
            Self::Success(aggregate) => {
                state.balance = Some(aggregate.total_usd_value);
                state.chains = aggregate.chains.clone();
                state.success = true;
                state.from_cache = false;
                state.missing_chains = None;
            }
            Self::PartialFailure(names) => {
                state.missing_chains = Some(names.clone());
                state.success = true;
            }
            Self::HardFailure => {
                state.success = false;
            }
        }
    }
}

/// Snapshot of what the consumer sees.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Total USD value, unset until some source produced one.
    pub balance: Option<Decimal>,
    /// Normalized chains from the last source that produced them.
    pub chains: Vec<ChainBalance>,
    pub loading: bool,
    pub success: bool,
    /// Whether `balance` and `chains` came from the local cache.
    pub from_cache: bool,
    /// Display names of chains the service could not reach.
    pub missing_chains: Option<Vec<Option<String>>>,
}

impl ControllerState {
    pub fn new(from_cache: bool) -> Self {
        Self {
            balance: None,
            chains: Vec::new(),
            loading: false,
            success: true,
            from_cache,
            missing_chains: None,
        }
    }

    /// Chains worth highlighting: those with a positive USD value.
    pub fn chains_with_value(&self) -> Vec<ChainBalance> {
        filter_chain_with_balance(&self.chains)
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(false)
    }
}
