//! In-memory balance cache with time-based expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::AddressBalance;
use crate::services::{BalanceService, CacheStore, RemoteError};

struct CacheEntry {
    balance: AddressBalance,
    stored_at: Instant,
}

/// Per-account balance cache keyed by lower-cased address.
///
/// Entries are never evicted on expiry; stale entries are still served by
/// [`CacheStore::get_address_cache_balance`] and only reported through
/// [`CacheStore::is_address_balance_expired`].
pub struct MemoryCacheStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a balance for an account, resetting its expiry clock.
    pub async fn put(&self, account: &str, balance: AddressBalance) {
        let key = account.to_lowercase();
        debug!(account = %key, "Caching address balance");
        self.entries.write().await.insert(
            key,
            CacheEntry {
                balance,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops the cached balance for an account.
    pub async fn invalidate(&self, account: &str) {
        self.entries.write().await.remove(&account.to_lowercase());
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_address_cache_balance(
        &self,
        account: &str,
    ) -> crate::Result<Option<AddressBalance>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&account.to_lowercase())
            .map(|entry| entry.balance.clone()))
    }

    async fn is_address_balance_expired(&self, account: &str) -> crate::Result<bool> {
        let entries = self.entries.read().await;
        Ok(match entries.get(&account.to_lowercase()) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => true,
        })
    }
}

/// Balance service decorator that writes every successful response into a
/// [`MemoryCacheStore`].
pub struct CachingBalanceService<S> {
    inner: S,
    cache: Arc<MemoryCacheStore>,
}

impl<S: BalanceService> CachingBalanceService<S> {
    pub fn new(inner: S, cache: Arc<MemoryCacheStore>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: BalanceService> BalanceService for CachingBalanceService<S> {
    async fn get_address_balance(
        &self,
        account: &str,
        force: bool,
    ) -> Result<AddressBalance, RemoteError> {
        let balance = self.inner.get_address_balance(account, force).await?;
        self.cache.put(account, balance.clone()).await;
        Ok(balance)
    }
}
