use std::sync::Arc;

use wallet_balance::BalanceError;
use wallet_balance::cache::{CachingBalanceService, MemoryCacheStore};
use wallet_balance::chain::StaticChainRegistry;
use wallet_balance::config::fetch_config;
use wallet_balance::controller::{BalanceController, FetchOptions, Services};
use wallet_balance::remote::{HttpBalanceService, StaticCapability};

#[tokio::main]
async fn main() -> Result<(), BalanceError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let Some(account) = std::env::args().nth(1) else {
        eprintln!("usage: wallet-balance <address>");
        std::process::exit(2);
    };

    let registry = match &app_config.chain_registry {
        Some(path) => StaticChainRegistry::load(path)?,
        None => StaticChainRegistry::default(),
    };
    let cache = Arc::new(MemoryCacheStore::new(app_config.cache.ttl));
    let remote = CachingBalanceService::new(
        HttpBalanceService::new(&app_config.service.api_url),
        cache.clone(),
    );

    let controller = BalanceController::new(
        Services {
            cache,
            remote: Arc::new(remote),
            capability: Arc::new(StaticCapability(app_config.service.api_level)),
            registry: Arc::new(registry),
        },
        FetchOptions {
            update: true,
            ..FetchOptions::default()
        },
    );

    controller.activate(Some(&account), 0).await;

    let state = controller.state();
    match state.balance {
        Some(total) => println!("total: ${total}"),
        None => println!("total: unavailable"),
    }
    for chain in state.chains_with_value() {
        println!("  {:<20} ${}", chain.name, chain.usd_value);
    }
    if let Some(missing) = &state.missing_chains {
        let names: Vec<&str> = missing
            .iter()
            .map(|name| name.as_deref().unwrap_or("unknown"))
            .collect();
        println!("unreachable chains: {}", names.join(", "));
    }
    if !state.success {
        println!("balance request failed; showing last known data");
    }

    Ok(())
}
