//! Cache-first balance controller.
//!
//! One fetch sequence runs per `(account, nonce)` scope:
//!
//! 1. The cache store and the capability level are read concurrently.
//! 2. Cached data, when present, is published immediately.
//! 3. Depending on the [`FetchStrategy`] and [`FetchOptions::update`], the
//!    balance service is called to refine it.
//!
//! Every scope change bumps a generation counter. Each write carries the
//! generation it was started under and is dropped if that generation is no
//! longer current, so a slow response for an old account never overwrites
//! state belonging to the new one.

mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chain::{
    ChainRegistry, filter_chain_with_balance, normalize_address_balance, normalize_chain_list,
    resolve_chain_names,
};
use crate::models::{AddressBalance, ChainBalance};
use crate::services::{BalanceService, CacheStore, CapabilityConfig, RemoteError};

pub use state::{ControllerState, EXTERNALLY_DRIVEN_MIN_LEVEL, FetchOutcome, FetchStrategy};

/// Capability level assumed when the capability service fails.
const FALLBACK_API_LEVEL: i64 = 0;

/// External collaborators the controller depends on.
#[derive(Clone)]
pub struct Services {
    pub cache: Arc<dyn CacheStore>,
    pub remote: Arc<dyn BalanceService>,
    pub capability: Arc<dyn CapabilityConfig>,
    pub registry: Arc<dyn ChainRegistry>,
}

/// Per-controller behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Refine cached data from the network when the strategy allows it.
    pub update: bool,
    /// Disable all fetching.
    pub no_need_balance: bool,
    /// Initial value of [`ControllerState::from_cache`].
    pub init_balance_from_cache: bool,
}

/// The `(account, nonce)` pair a fetch sequence belongs to.
#[derive(Debug, Default)]
struct Scope {
    account: Option<String>,
    nonce: i64,
    generation: u64,
    /// A network success has been applied in this generation.
    network_applied: bool,
}

/// Aggregates an account's balances from the cache and the balance service.
pub struct BalanceController {
    services: Services,
    options: FetchOptions,
    scope: Mutex<Scope>,
    state: watch::Sender<ControllerState>,
}

impl BalanceController {
    pub fn new(services: Services, options: FetchOptions) -> Self {
        let (state, _) = watch::channel(ControllerState::new(options.init_balance_from_cache));
        Self {
            services,
            options,
            scope: Mutex::new(Scope::default()),
            state,
        }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Current chains with a positive USD value.
    pub fn chains_with_value(&self) -> Vec<ChainBalance> {
        filter_chain_with_balance(&self.state.borrow().chains)
    }

    /// The account of the current scope.
    pub fn account(&self) -> Option<String> {
        self.lock_scope().account.clone()
    }

    /// The nonce of the current scope.
    pub fn nonce(&self) -> i64 {
        self.lock_scope().nonce
    }

    /// The raw balance service, for callers that need to bypass the controller.
    pub fn remote(&self) -> &Arc<dyn BalanceService> {
        &self.services.remote
    }

    /// Enters a new `(account, nonce)` scope and runs its fetch sequence.
    ///
    /// A negative `nonce` enters the scope without fetching. Alongside the
    /// main sequence the cached chain list is re-read and republished; that
    /// write is skipped once a network result has landed in the same scope.
    ///
    /// Returns `None` when nothing was fetched or the result was superseded.
    pub async fn activate(&self, account: Option<&str>, nonce: i64) -> Option<FetchOutcome> {
        let generation = self.enter_scope(account, nonce);
        if nonce < 0 {
            debug!(nonce, generation, "Negative nonce, deferring balance fetch");
            return None;
        }

        let (outcome, ()) = tokio::join!(
            self.run_fetch(generation, false),
            self.republish_cached_chains(generation)
        );
        outcome
    }

    /// Runs the fetch sequence for the current scope.
    ///
    /// `force` is forwarded to the balance service when it is called.
    pub async fn fetch_balance(&self, force: bool) -> Option<FetchOutcome> {
        let generation = self.current_generation();
        self.run_fetch(generation, force).await
    }

    /// Same as [`fetch_balance`](Self::fetch_balance) with `force = true`.
    pub async fn refresh(&self) -> Option<FetchOutcome> {
        self.fetch_balance(true).await
    }

    /// Calls the balance service directly and applies the result to the
    /// current scope. This is the manual trigger for externally driven
    /// capability levels.
    pub async fn get_address_balance(&self, account: &str, force: bool) -> Option<FetchOutcome> {
        let generation = self.current_generation();
        self.fetch_remote(generation, account, force).await
    }

    /// Reports whether the cached balance for `account` is stale.
    ///
    /// Store failures are reported as "not expired".
    pub async fn is_balance_expired(&self, account: &str) -> bool {
        let account = account.to_lowercase();
        match self
            .services
            .cache
            .is_address_balance_expired(&account)
            .await
        {
            Ok(expired) => expired,
            Err(e) => {
                debug!(account = %account, error = %e, "Expiry check failed, treating as fresh");
                false
            }
        }
    }

    /// [`is_balance_expired`](Self::is_balance_expired) for the current
    /// account; `false` when no account is selected.
    pub async fn is_current_balance_expired(&self) -> bool {
        match self.account() {
            Some(account) => self.is_balance_expired(&account).await,
            None => false,
        }
    }

    /// Tears down the current scope. In-flight work is discarded.
    pub fn dispose(&self) {
        let mut scope = self.lock_scope();
        scope.generation += 1;
        scope.account = None;
        scope.network_applied = false;
        debug!(generation = scope.generation, "Balance controller disposed");
    }

    async fn run_fetch(&self, generation: u64, force: bool) -> Option<FetchOutcome> {
        if self.options.no_need_balance {
            return None;
        }
        let account = self.scoped_account(generation)?;

        if !self.apply(generation, |state| state.loading = true) {
            return None;
        }

        let (cached, level) = tokio::join!(self.read_cache(&account), self.read_level());
        let strategy = FetchStrategy::from_level(level);
        debug!(
            account = %account,
            generation,
            level,
            strategy = strategy.as_str(),
            cache_hit = cached.is_some(),
            "Balance fetch sequence started"
        );

        match cached {
            Some(cached) => {
                let aggregate = normalize_address_balance(&cached, self.services.registry.as_ref());
                let applied = self.apply(generation, |state| {
                    state.from_cache = true;
                    state.balance = Some(aggregate.total_usd_value);
                    state.chains = aggregate.chains.clone();
                });
                if !applied {
                    debug!(account = %account, generation, "Discarding stale cache read");
                    return None;
                }

                if self.options.update && strategy == FetchStrategy::ClientDriven {
                    self.fetch_remote(generation, &account, force).await
                } else {
                    self.apply(generation, |state| state.loading = false);
                    Some(FetchOutcome::Success(aggregate))
                }
            }
            None => match strategy {
                FetchStrategy::ClientDriven => {
                    let outcome = self.fetch_remote(generation, &account, force).await;
                    self.apply(generation, |state| {
                        state.loading = false;
                        state.from_cache = false;
                    });
                    outcome
                }
                FetchStrategy::ExternallyDriven => {
                    self.apply(generation, |state| state.loading = false);
                    None
                }
            },
        }
    }

    async fn fetch_remote(
        &self,
        generation: u64,
        account: &str,
        force: bool,
    ) -> Option<FetchOutcome> {
        let account = account.to_lowercase();
        let outcome = match self
            .services
            .remote
            .get_address_balance(&account, force)
            .await
        {
            Ok(balance) => FetchOutcome::Success(normalize_address_balance(
                &balance,
                self.services.registry.as_ref(),
            )),
            Err(e) => self.classify_failure(&account, e),
        };

        let applied = self.apply_scoped(generation, |scope, state| {
            if matches!(outcome, FetchOutcome::Success(_)) {
                scope.network_applied = true;
            }
            outcome.apply_to(state);
            true
        });
        if !applied {
            debug!(account = %account, generation, "Discarding stale balance response");
            return None;
        }

        if let FetchOutcome::Success(ref aggregate) = outcome {
            info!(
                account = %account,
                total_usd_value = %aggregate.total_usd_value,
                chains = aggregate.chains.len(),
                "Balance updated from network"
            );
        }
        Some(outcome)
    }

    fn classify_failure(&self, account: &str, error: RemoteError) -> FetchOutcome {
        match error {
            RemoteError::ChainsUnavailable { chain_ids } => {
                let names = resolve_chain_names(&chain_ids, self.services.registry.as_ref());
                info!(
                    account,
                    chain_ids = ?chain_ids,
                    "Balance fetched with unreachable chains"
                );
                FetchOutcome::PartialFailure(names)
            }
            RemoteError::Malformed(detail) => {
                warn!(account, detail = %detail, "Unparseable balance error payload");
                FetchOutcome::HardFailure
            }
            other => {
                warn!(account, error = %other, "Balance request failed");
                FetchOutcome::HardFailure
            }
        }
    }

    async fn republish_cached_chains(&self, generation: u64) {
        if self.options.no_need_balance {
            return;
        }
        let Some(account) = self.scoped_account(generation) else {
            return;
        };

        let chains = self
            .read_cache(&account)
            .await
            .map(|cached| normalize_chain_list(&cached.chain_list, self.services.registry.as_ref()))
            .unwrap_or_default();

        self.apply_scoped(generation, |scope, state| {
            if scope.network_applied {
                debug!(generation, "Network chains already applied, skipping cache republish");
                return false;
            }
            state.chains = chains;
            true
        });
    }

    /// Reads the cache, treating store failures as a miss.
    async fn read_cache(&self, account: &str) -> Option<AddressBalance> {
        match self.services.cache.get_address_cache_balance(account).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(account, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Reads the capability level, falling back to client-driven fetching.
    async fn read_level(&self) -> i64 {
        match self.services.capability.api_level().await {
            Ok(level) => level,
            Err(e) => {
                warn!(error = %e, fallback = FALLBACK_API_LEVEL, "Capability lookup failed");
                FALLBACK_API_LEVEL
            }
        }
    }

    fn enter_scope(&self, account: Option<&str>, nonce: i64) -> u64 {
        let mut scope = self.lock_scope();
        let account_changed = scope.account.as_deref() != account;

        scope.generation += 1;
        scope.account = account.map(str::to_string);
        scope.nonce = nonce;
        scope.network_applied = false;

        if account_changed {
            self.state
                .send_replace(ControllerState::new(self.options.init_balance_from_cache));
        }
        debug!(
            account = ?scope.account,
            nonce,
            generation = scope.generation,
            "Entered balance scope"
        );
        scope.generation
    }

    fn current_generation(&self) -> u64 {
        self.lock_scope().generation
    }

    fn scoped_account(&self, generation: u64) -> Option<String> {
        let scope = self.lock_scope();
        if scope.generation != generation {
            return None;
        }
        scope.account.clone()
    }

    /// Applies `update` if `generation` is still current.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut ControllerState)) -> bool {
        self.apply_scoped(generation, |_, state| {
            update(state);
            true
        })
    }

    /// Applies `update` with access to the scope if `generation` is still
    /// current. `update` returns whether it changed the state.
    fn apply_scoped(
        &self,
        generation: u64,
        update: impl FnOnce(&mut Scope, &mut ControllerState) -> bool,
    ) -> bool {
        let mut scope = self.lock_scope();
        if scope.generation != generation {
            return false;
        }
        self.state.send_if_modified(|state| update(&mut *scope, state));
        true
    }

    fn lock_scope(&self) -> MutexGuard<'_, Scope> {
        self.scope.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
