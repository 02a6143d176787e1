//! Shared balance models.

pub mod balance;

pub use balance::{AddressBalance, AggregateBalance, ChainBalance, ChainMeta, ChainWithBalance};
