use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One named AI provider configuration.
///
/// `is_active` mirrors `ProviderDocument::active_config_id` and is recomputed
/// on every load and mutation; it is never read back as a source of truth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub api_base_url: String,
    pub api_key: String,
    pub model_name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"[REDACTED]")
            .field("model_name", &self.model_name)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Payload for creating a configuration. Missing fields deserialize as empty
/// strings so validation reports them instead of the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewProviderConfig {
    pub name: String,
    pub api_base_url: String,
    pub api_key: String,
    pub model_name: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfigPatch {
    pub name: Option<String>,
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
}

/// The persisted document: every configuration plus the active selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDocument {
    pub configurations: Vec<ProviderConfig>,
    pub active_config_id: Option<String>,
}

impl ProviderDocument {
    /// Build a document from raw JSON, requiring the full shape: an object with
    /// a `configurations` array and an `activeConfigId` key (string or null).
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.get("configurations")?.is_array() {
            return None;
        }
        match obj.get("activeConfigId")? {
            serde_json::Value::Null | serde_json::Value::String(_) => {},
            _ => return None,
        }
        let mut doc: Self = serde_json::from_value(value).ok()?;
        doc.repair_active();
        Some(doc)
    }

    /// Point a missing or dangling selection at the first configuration (or
    /// clear it when there is none), then re-derive the flags.
    pub fn repair_active(&mut self) {
        if self.active().is_none() {
            self.active_config_id = self.configurations.first().map(|c| c.id.clone());
        }
        self.refresh_active_flags();
    }

    /// Re-derive every `is_active` flag from `active_config_id`.
    pub fn refresh_active_flags(&mut self) {
        let active = self.active_config_id.as_deref();
        for config in &mut self.configurations {
            config.is_active = Some(config.id.as_str()) == active;
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.configurations.iter().find(|c| c.id == id)
    }

    /// The active configuration, if the selection points at an existing entry.
    pub fn active(&self) -> Option<&ProviderConfig> {
        self.active_config_id.as_deref().and_then(|id| self.get(id))
    }

    /// Select `id` as the active configuration.
    pub fn set_active(&mut self, id: &str) -> Result<ProviderConfig, ProviderError> {
        if self.get(id).is_none() {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        self.active_config_id = Some(id.to_string());
        self.refresh_active_flags();
        self.get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// Append a new configuration with a fresh id. The first configuration
    /// added to a document without an active selection becomes active.
    pub fn insert(&mut self, new: NewProviderConfig) -> Result<ProviderConfig, ProviderError> {
        let config = ProviderConfig {
            id: uuid::Uuid::new_v4().to_string(),
            name: required("name", new.name)?,
            api_base_url: required("apiBaseUrl", new.api_base_url)?,
            api_key: required("apiKey", new.api_key)?,
            model_name: required("modelName", new.model_name)?,
            is_active: false,
        };
        let id = config.id.clone();
        self.configurations.push(config);
        if self.active().is_none() {
            self.active_config_id = Some(id.clone());
        }
        self.refresh_active_flags();
        self.get(&id)
            .cloned()
            .ok_or(ProviderError::NotFound(id))
    }

    /// Apply a partial update to an existing configuration.
    pub fn update(
        &mut self,
        id: &str,
        patch: ProviderConfigPatch,
    ) -> Result<ProviderConfig, ProviderError> {
        let config = self
            .configurations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            config.name = required("name", name)?;
        }
        if let Some(url) = patch.api_base_url {
            config.api_base_url = required("apiBaseUrl", url)?;
        }
        if let Some(key) = patch.api_key {
            config.api_key = required("apiKey", key)?;
        }
        if let Some(model) = patch.model_name {
            config.model_name = required("modelName", model)?;
        }

        self.refresh_active_flags();
        self.get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// Remove a configuration. Removing the active one hands the selection to
    /// the first remaining entry, or clears it when none remain.
    pub fn remove(&mut self, id: &str) -> Result<ProviderConfig, ProviderError> {
        let index = self
            .configurations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let removed = self.configurations.remove(index);
        self.repair_active();
        Ok(removed)
    }
}

fn required(field: &str, value: String) -> Result<String, ProviderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
