use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, info, warn};

use crate::{env_subst::substitute_env, schema::TabulaConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["tabula.toml", "tabula.yaml", "tabula.yml", "tabula.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, discovery only looks in this
/// directory (project-local and user-global paths are skipped).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<TabulaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Outcome of config discovery.
#[derive(Debug)]
pub struct Discovered {
    /// The configuration in effect.
    pub config: TabulaConfig,
    /// The file the configuration came from, if one was found.
    pub path: Option<PathBuf>,
    /// Why a discovered file was ignored in favour of defaults.
    pub error: Option<anyhow::Error>,
}

impl Discovered {
    fn defaults(path: Option<PathBuf>, error: Option<anyhow::Error>) -> Self {
        Self {
            config: TabulaConfig::default(),
            path,
            error,
        }
    }

    /// Log where the configuration came from. Call once a subscriber is
    /// installed; discovery itself runs before logging is set up.
    pub fn report(&self) {
        match (&self.path, &self.error) {
            (Some(path), Some(e)) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
            (Some(path), None) => info!(path = %path.display(), "loaded config"),
            (None, _) => debug!("no config file found, using defaults"),
        }
    }
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./tabula.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/tabula/tabula.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `TabulaConfig::default()` if no file is found or the file
/// found cannot be parsed; the parse error is kept in [`Discovered::error`].
pub fn discover() -> Discovered {
    let Some(path) = find_config_file() else {
        return Discovered::defaults(None, None);
    };
    match load_config(&path) {
        Ok(config) => Discovered {
            config,
            path: Some(path),
            error: None,
        },
        Err(e) => Discovered::defaults(Some(path), Some(e)),
    }
}

/// Load an explicitly requested file, or fall back to discovery.
///
/// Unlike discovery, an explicit path that cannot be loaded is an error.
pub fn load_or_discover(explicit: Option<&Path>) -> anyhow::Result<Discovered> {
    match explicit {
        Some(path) => Ok(Discovered {
            config: load_config(path)?,
            path: Some(path.to_path_buf()),
            error: None,
        }),
        None => Ok(discover()),
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }

    first_existing(Path::new(".")).or_else(|| config_dir().and_then(|dir| first_existing(&dir)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/tabula/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("tabula"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<TabulaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
