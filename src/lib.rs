//! Cache-first multi-chain balance aggregation for wallet clients.
//!
//! Given an account address, [`controller::BalanceController`] publishes a
//! progressively refined view of the account's total USD value and its
//! per-chain breakdown, preferring the local cache and calling the remote
//! balance service depending on the session's capability level.

pub mod cache;
pub mod chain;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;

pub use error::{BalanceError, Result};
