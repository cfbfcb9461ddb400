use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use tabula_common::json_file;

use crate::{
    error::ProviderError,
    types::{NewProviderConfig, ProviderConfig, ProviderConfigPatch, ProviderDocument},
};

/// File-backed provider configuration store.
#[derive(Debug)]
pub struct ProviderStore {
    path: PathBuf,
    /// Serialises load-modify-save cycles within this process.
    write_lock: Mutex<()>,
}

impl ProviderStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document. Absence, read errors and malformed shapes
    /// all yield an empty document.
    pub fn load(&self) -> ProviderDocument {
        match json_file::read_value(&self.path) {
            Ok(Some(value)) => ProviderDocument::from_value(value).unwrap_or_else(|| {
                warn!(path = %self.path.display(), "AI config document has an invalid shape, using empty");
                ProviderDocument::default()
            }),
            Ok(None) => {
                debug!(path = %self.path.display(), "no AI config document yet");
                ProviderDocument::default()
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to load AI configs, using empty");
                ProviderDocument::default()
            },
        }
    }

    /// Persist the document as-is, readable by the owner only since it holds
    /// API keys. Failures are logged, not returned.
    pub fn save(&self, doc: &ProviderDocument) {
        if let Err(e) = json_file::write_private(&self.path, doc) {
            warn!(path = %self.path.display(), error = %e, "failed to save AI configs");
        }
    }

    /// The currently active configuration, if any.
    pub fn active(&self) -> Option<ProviderConfig> {
        self.load().active().cloned()
    }

    pub fn add(
        &self,
        new: NewProviderConfig,
    ) -> Result<(ProviderConfig, ProviderDocument), ProviderError> {
        self.modify(|doc| doc.insert(new))
    }

    pub fn update(
        &self,
        id: &str,
        patch: ProviderConfigPatch,
    ) -> Result<(ProviderConfig, ProviderDocument), ProviderError> {
        self.modify(|doc| doc.update(id, patch))
    }

    pub fn set_active(&self, id: &str) -> Result<(ProviderConfig, ProviderDocument), ProviderError> {
        self.modify(|doc| doc.set_active(id))
    }

    pub fn delete(&self, id: &str) -> Result<ProviderDocument, ProviderError> {
        self.modify(|doc| doc.remove(id)).map(|(_, doc)| doc)
    }

    /// Load, apply `f`, and save when `f` succeeds. Returns the closure's value
    /// and the document as saved.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut ProviderDocument) -> Result<T, ProviderError>,
    ) -> Result<(T, ProviderDocument), ProviderError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.load();
        let value = f(&mut doc)?;
        self.save(&doc);
        Ok((value, doc))
    }
}
