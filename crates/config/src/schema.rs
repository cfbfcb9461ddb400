/// Config schema types (server, storage, generator, supported formats).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabulaConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub formats: FormatsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Upper bound for a multipart request body, uploaded file included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3001,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// On-disk locations. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            uploads_dir: PathBuf::from("uploads"),
            charts_dir: PathBuf::from("charts"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl StorageConfig {
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn providers_path(&self) -> PathBuf {
        self.data_dir.join("ai_configs.json")
    }
}

/// How the external code generator is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Executable to spawn.
    pub program: String,
    /// Leading arguments placed before the per-request ones (typically the script path).
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Wall-clock limit for one invocation.
    pub timeout_secs: u64,
    /// Model used when neither the request nor the active provider names one.
    pub fallback_model: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "python".into(),
            args: vec!["pandasai_runner.py".into()],
            working_dir: None,
            timeout_secs: 60,
            fallback_model: "deepseek-chat".into(),
        }
    }
}

impl GeneratorConfig {
    /// Human-readable command line, for startup logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Upload formats advertised to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    pub supported: Vec<String>,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            supported: ["csv", "xlsx", "xls", "json", "parquet", "feather", "pickle", "pkl"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
