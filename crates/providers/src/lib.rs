//! AI provider configurations: the named endpoint/credential sets a generation
//! request can run against, and which one is currently active.
//!
//! Persisted as a single JSON document (`ai_configs.json`). Loading never
//! fails: a missing or malformed document degrades to an empty one.

pub mod error;
pub mod store;
pub mod types;

pub use {
    error::ProviderError,
    store::ProviderStore,
    types::{NewProviderConfig, ProviderConfig, ProviderConfigPatch, ProviderDocument},
};
