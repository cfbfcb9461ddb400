//! CRUD over the AI provider configurations.

use std::sync::Arc;

use {
    axum::{
        Json,
        extract::{Path, State, rejection::JsonRejection},
        http::StatusCode,
    },
    serde_json::{Value, json},
    tracing::info,
};

use tabula_providers::{NewProviderConfig, ProviderConfigPatch, ProviderDocument};

use crate::{error::ApiError, state::GatewayState};

pub async fn list(State(state): State<Arc<GatewayState>>) -> Json<ProviderDocument> {
    Json(state.providers.load())
}

pub async fn create(
    State(state): State<Arc<GatewayState>>,
    input: Result<Json<NewProviderConfig>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = input?;
    let (config, document) = state.providers.add(input)?;
    info!(id = %config.id, name = %config.name, "AI configuration added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "config": config, "document": document })),
    ))
}

pub async fn update(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    patch: Result<Json<ProviderConfigPatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = patch?;
    let (config, document) = state.providers.update(&id, patch)?;
    info!(id = %config.id, "AI configuration updated");
    Ok(Json(json!({ "config": config, "document": document })))
}

pub async fn set_active(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (config, document) = state.providers.set_active(&id)?;
    info!(id = %config.id, name = %config.name, "active AI configuration changed");
    Ok(Json(json!({ "config": config, "document": document })))
}

pub async fn delete(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let document = state.providers.delete(&id)?;
    info!(
        id = %id,
        active = document.active_config_id.as_deref().unwrap_or("none"),
        "AI configuration deleted"
    );
    Ok(Json(json!({ "document": document })))
}
