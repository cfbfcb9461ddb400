use std::{path::PathBuf, sync::Arc, time::Instant};

use tracing::warn;

use {
    tabula_config::TabulaConfig,
    tabula_generator::{Generator, GeneratorSettings},
    tabula_history::HistoryStore,
    tabula_media::UploadStore,
    tabula_providers::ProviderStore,
};

/// Shared gateway runtime state, wrapped in Arc for use across handlers.
pub struct GatewayState {
    /// Server version string.
    pub version: String,
    pub started_at: Instant,
    pub generator: Generator,
    pub providers: Arc<ProviderStore>,
    pub history: Arc<HistoryStore>,
    pub uploads: UploadStore,
    pub charts_dir: PathBuf,
    /// Upload formats advertised by `/api/supported_formats`.
    pub formats: Vec<String>,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn from_config(config: &TabulaConfig) -> Arc<Self> {
        let storage = &config.storage;
        let providers = Arc::new(ProviderStore::new(storage.providers_path()));
        let history = Arc::new(HistoryStore::new(storage.history_path()));
        let generator = Generator::new(
            GeneratorSettings::from(&config.generator),
            Arc::clone(&providers),
            Arc::clone(&history),
            storage.charts_dir.clone(),
        );

        Arc::new(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Instant::now(),
            generator,
            providers,
            history,
            uploads: UploadStore::new(storage.uploads_dir.clone()),
            charts_dir: storage.charts_dir.clone(),
            formats: config.formats.supported.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }

    /// Create the data, upload and chart directories up front. Failures are
    /// logged; the stores and locator degrade on their own.
    pub fn ensure_dirs(&self) {
        let dirs = [
            self.history.path().parent().map(PathBuf::from),
            Some(self.uploads.dir().to_path_buf()),
            Some(self.charts_dir.clone()),
        ];
        for dir in dirs.into_iter().flatten() {
            if dir.as_os_str().is_empty() {
                continue;
            }
            if let Err(e) = std::fs::create_dir_all(&dir) {
                warn!(dir = %dir.display(), error = %e, "failed to create directory");
            }
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
