//! Gateway: HTTP API in front of the code generator, the provider
//! configurations and the analysis history.
//!
//! Lifecycle:
//! 1. Load config
//! 2. Build shared state (stores, upload area, generator)
//! 3. Create data directories
//! 4. Bind and serve until Ctrl-C

pub mod ai_configs;
pub mod api;
pub mod error;
pub mod server;
pub mod state;

pub use {
    error::ApiError,
    server::{build_gateway_app, start_gateway},
    state::GatewayState,
};
