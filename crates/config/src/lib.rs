//! Configuration loading and schema.
//!
//! Config files: `tabula.toml`, `tabula.yaml`, or `tabula.json`
//! Searched in `./` then `~/.config/tabula/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        Discovered, clear_config_dir, config_dir, discover, load_config, load_or_discover,
        set_config_dir,
    },
    schema::{FormatsConfig, GeneratorConfig, ServerConfig, StorageConfig, TabulaConfig},
};
