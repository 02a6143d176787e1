//! Deserialization tests for balance service payloads.

mod common;

use rust_decimal_macros::dec;

use wallet_balance::chain::{ChainRegistry, normalize_address_balance};
use wallet_balance::models::{AddressBalance, ChainMeta};

use common::{ADDRESS_BALANCE_JSON, CHAINS_JSON, registry};

#[test]
fn test_address_balance_deserializes() {
    let balance: AddressBalance =
        serde_json::from_str(ADDRESS_BALANCE_JSON).expect("Failed to deserialize balance");

    assert_eq!(balance.total_usd_value, dec!(1532.75));
    assert_eq!(balance.chain_list.len(), 4);

    let eth = &balance.chain_list[0];
    assert_eq!(eth.id, "eth");
    assert_eq!(eth.community_id, 1);
    assert_eq!(eth.usd_value, dec!(1200.5));
    assert_eq!(eth.born_at, Some(1528520000));

    assert_eq!(balance.chain_list[2].born_at, None);
}

#[test]
fn test_string_encoded_values_deserialize() {
    let json = r#"{
        "total_usd_value": "10.25",
        "chain_list": [
            {"id": "op", "community_id": 10, "name": "OP", "usd_value": "10.25", "born_at": 1}
        ]
    }"#;
    let balance: AddressBalance = serde_json::from_str(json).expect("Failed to deserialize");

    assert_eq!(balance.total_usd_value, dec!(10.25));
    assert_eq!(balance.chain_list[0].logo_url, "");
}

#[test]
fn test_missing_chain_list_defaults_to_empty() {
    let balance: AddressBalance =
        serde_json::from_str(r#"{"total_usd_value": 0}"#).expect("Failed to deserialize");
    assert!(balance.chain_list.is_empty());
}

#[test]
fn test_chain_registry_fixture_deserializes() {
    let chains: Vec<ChainMeta> =
        serde_json::from_str(CHAINS_JSON).expect("Failed to deserialize chains");

    assert_eq!(chains.len(), 3);
    assert!(chains[0].white_logo.is_some());
    assert!(chains[1].white_logo.is_none());

    let registry = registry();
    assert_eq!(registry.resolve_by_id(56).unwrap().server_id, "bsc");
    assert_eq!(registry.resolve_by_server_id("op").unwrap().id, 10);
}

#[test]
fn test_total_diverges_from_chain_sum() {
    let balance: AddressBalance =
        serde_json::from_str(ADDRESS_BALANCE_JSON).expect("Failed to deserialize balance");
    let aggregate = normalize_address_balance(&balance, &registry());

    let chain_sum: rust_decimal::Decimal = aggregate.chains.iter().map(|c| c.usd_value).sum();
    assert_eq!(chain_sum, dec!(1532.70));
    assert_eq!(aggregate.total_usd_value, dec!(1532.75));
}
