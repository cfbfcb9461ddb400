use {
    axum::{
        Json,
        extract::{multipart::MultipartError, rejection::JsonRejection},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    tracing::{error, warn},
};

use {tabula_generator::GenerateError, tabula_providers::ProviderError};

/// An error rendered to clients as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        error!(error = %err, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        if err.is_client_error() {
            warn!(error = %err, "rejected generate request");
            return Self::new(StatusCode::BAD_REQUEST, err.to_string());
        }
        if let GenerateError::ResultParseError { snippet, .. } = &err {
            error!(error = %err, raw = %snippet, "generate failed");
        } else {
            error!(error = %err, "generate failed");
        }
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        let status = match err {
            ProviderError::NotFound(_) => StatusCode::NOT_FOUND,
            ProviderError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        warn!(error = %err, "malformed multipart request");
        Self::new(err.status(), err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        warn!(error = %err, "malformed JSON body");
        Self::new(err.status(), err.body_text())
    }
}
