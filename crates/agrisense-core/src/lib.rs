//! Core types and trait definitions for AgriSense.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, provider clients and the HTTP surface all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod advisory;
pub mod alert;
pub mod assistant;
pub mod error;
pub mod notice;
pub mod provider;
pub mod session;
pub mod speech;
pub mod store;
pub mod turn;

pub use error::{AudioError, Error, ProviderError, Result};

#[cfg(test)]
mod testing;
