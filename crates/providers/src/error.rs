/// Failures surfaced by provider configuration mutations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("AI configuration not found: {0}")]
    NotFound(String),

    #[error("invalid AI configuration: {0}")]
    Invalid(String),
}
