//! Bounded, newest-first history of generation results.
//!
//! Entries are opaque JSON documents owned by the generator; this crate only
//! orders, caps and persists them.

pub mod store;

pub use store::{HistoryStore, MAX_HISTORY_ENTRIES};
