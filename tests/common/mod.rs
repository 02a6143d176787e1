//! Shared test doubles and fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use wallet_balance::chain::StaticChainRegistry;
use wallet_balance::controller::{BalanceController, FetchOptions, Services};
use wallet_balance::models::{AddressBalance, ChainMeta, ChainWithBalance};
use wallet_balance::services::{BalanceService, CacheStore, CapabilityConfig, RemoteError};
use wallet_balance::{BalanceError, Result};

pub const ADDRESS_BALANCE_JSON: &str = include_str!("../fixtures/address_balance.json");
pub const CHAINS_JSON: &str = include_str!("../fixtures/chains.json");

pub fn fixture_balance() -> AddressBalance {
    serde_json::from_str(ADDRESS_BALANCE_JSON).expect("Failed to parse balance fixture")
}

pub fn registry() -> StaticChainRegistry {
    let chains: Vec<ChainMeta> =
        serde_json::from_str(CHAINS_JSON).expect("Failed to parse chain fixture");
    StaticChainRegistry::from_chains(chains)
}

/// A one-chain balance whose total and chain value are both `total`.
pub fn simple_balance(total: Decimal) -> AddressBalance {
    AddressBalance {
        total_usd_value: total,
        chain_list: vec![ChainWithBalance {
            id: "op".to_string(),
            community_id: 10,
            name: "OP".to_string(),
            logo_url: String::new(),
            usd_value: total,
            born_at: Some(1_650_000_000),
        }],
    }
}

/// Blocks the caller until the test adds a permit.
#[derive(Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn closed() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub fn open(&self, permits: usize) {
        self.0.add_permits(permits);
    }

    async fn pass(&self) {
        let permit = self.0.acquire().await.expect("gate closed");
        permit.forget();
    }
}

#[derive(Default)]
pub struct MockCache {
    entries: HashMap<String, AddressBalance>,
    fail_reads: bool,
    fail_expiry: bool,
    expired: bool,
    gate: Option<(String, Gate)>,
    pub reads: AtomicUsize,
}

impl MockCache {
    pub fn with_entry(mut self, account: &str, balance: AddressBalance) -> Self {
        self.entries.insert(account.to_string(), balance);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_expiry(mut self) -> Self {
        self.fail_expiry = true;
        self
    }

    pub fn expired(mut self, expired: bool) -> Self {
        self.expired = expired;
        self
    }

    /// Reads for `account` wait on `gate`.
    pub fn gated(mut self, account: &str, gate: Gate) -> Self {
        self.gate = Some((account.to_string(), gate));
        self
    }
}

#[async_trait]
impl CacheStore for MockCache {
    async fn get_address_cache_balance(&self, account: &str) -> Result<Option<AddressBalance>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some((gated, gate)) = &self.gate {
            if gated == account {
                gate.pass().await;
            }
        }
        if self.fail_reads {
            return Err(BalanceError::Cache("store unavailable".to_string()));
        }
        Ok(self.entries.get(account).cloned())
    }

    async fn is_address_balance_expired(&self, _account: &str) -> Result<bool> {
        if self.fail_expiry {
            return Err(BalanceError::Cache("store unavailable".to_string()));
        }
        Ok(self.expired)
    }
}

/// Canned reply for [`MockRemote`].
#[derive(Clone)]
pub enum Reply {
    Balance(AddressBalance),
    /// Error body returned by the service, parsed like a real response.
    ErrorPayload(String),
}

#[derive(Default)]
pub struct MockRemote {
    replies: HashMap<String, Reply>,
    gate: Option<Gate>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl MockRemote {
    pub fn with_reply(mut self, account: &str, reply: Reply) -> Self {
        self.replies.insert(account.to_string(), reply);
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// `(account, force)` for every call received so far.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceService for MockRemote {
    async fn get_address_balance(
        &self,
        account: &str,
        force: bool,
    ) -> std::result::Result<AddressBalance, RemoteError> {
        self.calls.lock().unwrap().push((account.to_string(), force));
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        match self.replies.get(account) {
            Some(Reply::Balance(balance)) => Ok(balance.clone()),
            Some(Reply::ErrorPayload(body)) => Err(RemoteError::from_payload(body)),
            None => Err(RemoteError::from_payload(r#"{"error_code":404}"#)),
        }
    }
}

/// Capability source; `None` makes the lookup fail.
pub struct MockCapability(pub Option<i64>);

#[async_trait]
impl CapabilityConfig for MockCapability {
    async fn api_level(&self) -> Result<i64> {
        self.0
            .ok_or_else(|| BalanceError::Capability("config service down".to_string()))
    }
}

pub struct Harness {
    pub controller: Arc<BalanceController>,
    pub cache: Arc<MockCache>,
    pub remote: Arc<MockRemote>,
}

pub fn harness(
    cache: MockCache,
    remote: MockRemote,
    level: Option<i64>,
    options: FetchOptions,
) -> Harness {
    let cache = Arc::new(cache);
    let remote = Arc::new(remote);
    let controller = BalanceController::new(
        Services {
            cache: cache.clone(),
            remote: remote.clone(),
            capability: Arc::new(MockCapability(level)),
            registry: Arc::new(registry()),
        },
        options,
    );
    Harness {
        controller: Arc::new(controller),
        cache,
        remote,
    }
}

pub fn update_options() -> FetchOptions {
    FetchOptions {
        update: true,
        ..FetchOptions::default()
    }
}

/// Yields until `done` holds, so spawned tasks can reach their await points.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
