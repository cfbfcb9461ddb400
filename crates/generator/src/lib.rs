//! Generation coordinator: runs one natural-language analysis request through
//! the external code generator and records the result.
//!
//! Lifecycle of one call:
//! 1. Validate the query
//! 2. Resolve the active AI configuration and effective model
//! 3. Spawn the generator once, bounded by a wall-clock timeout
//! 4. Parse its single JSON document from stdout
//! 5. On success, append to history and look up the latest chart
//!
//! Every failure is terminal for the call; nothing is retried.

pub mod coordinator;
pub mod error;
pub mod exec;

pub use {
    coordinator::{GenerateRequest, Generator, GeneratorSettings},
    error::GenerateError,
};
