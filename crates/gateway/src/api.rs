//! Analysis endpoints: generate, history, latest chart, supported formats.

use std::sync::Arc;

use {
    axum::{
        Json,
        extract::{Multipart, State},
        http::StatusCode,
    },
    serde_json::{Value, json},
    tracing::{debug, info},
};

use {
    tabula_common::time::rfc3339,
    tabula_generator::GenerateRequest,
    tabula_media::find_latest,
};

use crate::{error::ApiError, state::GatewayState};

/// Multipart field names accepted for the data file.
const FILE_FIELDS: &[&str] = &["csv_file", "file"];

pub async fn generate(
    State(state): State<Arc<GatewayState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut request = GenerateRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "query" => request.query = field.text().await?,
            "model" => request.model = Some(field.text().await?),
            "preference" => request.preference = Some(field.text().await?),
            n if FILE_FIELDS.contains(&n) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty, unnamed part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let stored = state
                    .uploads
                    .store(&file_name, &bytes)
                    .map_err(ApiError::internal)?;
                request.file = Some(stored);
            },
            other => debug!(field = other, "ignoring multipart field"),
        }
    }

    info!(
        query = %request.query,
        model = request.model.as_deref().unwrap_or("None"),
        preference = request.preference.as_deref().unwrap_or("None"),
        has_file = request.file.is_some(),
        "generate request"
    );

    let result = state.generator.generate(request).await?;
    Ok(Json(result))
}

pub async fn latest_chart(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Value>, ApiError> {
    let chart = find_latest(&state.charts_dir)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No chart available"))?;
    Ok(Json(json!({
        "chartUrl": format!("/charts/{}", chart.file_name),
        "fileName": chart.file_name,
        "timestamp": rfc3339(chart.created),
    })))
}

pub async fn history(State(state): State<Arc<GatewayState>>) -> Json<Vec<Value>> {
    Json(state.history.load())
}

pub async fn clear_history(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    state.history.clear();
    info!("history cleared");
    Json(json!({ "status": "success" }))
}

pub async fn supported_formats(State(state): State<Arc<GatewayState>>) -> Json<Vec<String>> {
    Json(state.formats.clone())
}
