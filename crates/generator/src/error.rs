/// Why a generate call failed.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("missing required parameter: {0}")]
    InvalidRequest(String),

    #[error("no usable AI configuration: {0}")]
    Unconfigured(String),

    #[error("code generation timed out after {0}s")]
    Timeout(u64),

    /// Non-zero exit (`exit_code` set) or an explicit `error` field in the
    /// generator's output (`exit_code` unset).
    #[error("{message}")]
    GenerationFailed {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("failed to parse generator output: {reason}")]
    ResultParseError { reason: String, snippet: String },

    #[error("failed to start generator: {0}")]
    Spawn(#[source] std::io::Error),
}

impl GenerateError {
    /// Whether the caller, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
