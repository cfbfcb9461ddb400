use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{DefaultBodyLimit, State},
        response::{IntoResponse, Json},
        routing::{get, post, put},
    },
    tracing::info,
};

use {tabula_common::time::now_rfc3339, tabula_config::TabulaConfig};

use crate::{ai_configs, api, state::GatewayState};

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/generate", post(api::generate))
        .route("/api/latest_chart", get(api::latest_chart))
        .route("/api/history", get(api::history))
        .route("/api/clear_history", post(api::clear_history))
        .route("/api/supported_formats", get(api::supported_formats))
        .route(
            "/api/ai-configs",
            get(ai_configs::list).post(ai_configs::create),
        )
        .route(
            "/api/ai-configs/{id}",
            put(ai_configs::update).delete(ai_configs::delete),
        )
        .route("/api/ai-configs/{id}/set-active", put(ai_configs::set_active))
        .layer(body_limit)
        .with_state(state)
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start_gateway(config: TabulaConfig) -> anyhow::Result<()> {
    let state = GatewayState::from_config(&config);
    state.ensure_dirs();

    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("tabula gateway v{}", state.version),
        format!("listening on {addr}"),
        format!("generator: {}", config.generator.command_line()),
        format!(
            "timeout: {}s, fallback model: {}",
            config.generator.timeout_secs, config.generator.fallback_model
        ),
        format!("data: {}", config.storage.data_dir.display()),
        format!("charts: {}", config.storage.charts_dir.display()),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptime": state.uptime_secs(),
        "timestamp": now_rfc3339(),
    }))
}
