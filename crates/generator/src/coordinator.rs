use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde_json::Value,
    tracing::{debug, info, warn},
};

use {
    tabula_config::GeneratorConfig,
    tabula_history::HistoryStore,
    tabula_media::{UploadedFile, find_latest},
    tabula_providers::{ProviderConfig, ProviderStore},
};

use crate::{
    error::GenerateError,
    exec::{self, ExecOpts, ExecOutcome},
};

/// File argument passed when the request carries no upload.
pub const NO_FILE_SENTINEL: &str = "none";

/// Preference argument passed when the request names none.
pub const DEFAULT_PREFERENCE: &str = "default";

/// How much raw stdout is kept in a parse error.
const OUTPUT_SNIPPET_CHARS: usize = 200;

/// Resolved launch settings for the external generator.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub fallback_model: String,
}

impl From<&GeneratorConfig> for GeneratorSettings {
    fn from(cfg: &GeneratorConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            working_dir: cfg.working_dir.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            fallback_model: cfg.fallback_model.clone(),
        }
    }
}

/// One analysis request as received from a client.
#[derive(Debug, Default)]
pub struct GenerateRequest {
    pub query: String,
    /// Uploaded data file; removed once the request finishes.
    pub file: Option<UploadedFile>,
    pub model: Option<String>,
    pub preference: Option<String>,
}

/// Everything handed to one generator process.
#[derive(Debug)]
struct Invocation {
    query: String,
    file_arg: String,
    model: String,
    preference: String,
    api_key: Secret<String>,
    api_base_url: String,
}

impl Invocation {
    /// `<query> <file|none> --model-name <m> --preference <p> --api-key <k> --api-base-url <u>`
    fn to_args(&self, leading: &[String]) -> Vec<String> {
        let mut args = leading.to_vec();
        args.extend([
            self.query.clone(),
            self.file_arg.clone(),
            "--model-name".into(),
            self.model.clone(),
            "--preference".into(),
            self.preference.clone(),
            "--api-key".into(),
            self.api_key.expose_secret().clone(),
            "--api-base-url".into(),
            self.api_base_url.clone(),
        ]);
        args
    }
}

/// Coordinates generate calls against shared stores. Calls may run
/// concurrently; each spawns its own process.
pub struct Generator {
    settings: GeneratorSettings,
    providers: Arc<ProviderStore>,
    history: Arc<HistoryStore>,
    charts_dir: PathBuf,
}

impl Generator {
    pub fn new(
        settings: GeneratorSettings,
        providers: Arc<ProviderStore>,
        history: Arc<HistoryStore>,
        charts_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            providers,
            history,
            charts_dir,
        }
    }

    /// Run one request end to end and return the generator's result document.
    pub async fn generate(&self, request: GenerateRequest) -> Result<Value, GenerateError> {
        let GenerateRequest {
            query,
            file,
            model,
            preference,
        } = request;

        if query.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("query".into()));
        }

        let provider = self.resolve_provider()?;
        let invocation = Invocation {
            query,
            file_arg: file
                .as_ref()
                .map(|f| f.path().display().to_string())
                .unwrap_or_else(|| NO_FILE_SENTINEL.to_string()),
            model: self.effective_model(model.as_deref(), &provider),
            preference: non_empty(preference.as_deref())
                .unwrap_or(DEFAULT_PREFERENCE)
                .to_string(),
            api_key: Secret::new(provider.api_key.clone()),
            api_base_url: provider.api_base_url.clone(),
        };

        info!(
            provider = %provider.name,
            model = %invocation.model,
            preference = %invocation.preference,
            file = file.as_ref().map(|f| f.original_name()).unwrap_or("none"),
            "processing generate request"
        );
        debug!(?invocation, "generator invocation");

        let opts = ExecOpts {
            timeout: self.settings.timeout,
            working_dir: self.settings.working_dir.clone(),
        };
        let outcome = exec::run(
            &self.settings.program,
            &invocation.to_args(&self.settings.args),
            &opts,
        )
        .await
        .map_err(GenerateError::Spawn)?;

        if let Some(file) = file {
            file.remove();
        }

        let stdout = match outcome {
            ExecOutcome::TimedOut => {
                return Err(GenerateError::Timeout(self.settings.timeout.as_secs()));
            },
            ExecOutcome::Exited { exit_code, stdout } => {
                info!(exit_code, "generator exited");
                if exit_code != 0 {
                    return Err(GenerateError::GenerationFailed {
                        exit_code: Some(exit_code),
                        message: format!("code generation failed: process exited with code {exit_code}"),
                    });
                }
                stdout
            },
        };

        let result = parse_output(&stdout)?;
        self.history.append(result.clone());
        self.note_latest_chart();
        Ok(result)
    }

    fn resolve_provider(&self) -> Result<ProviderConfig, GenerateError> {
        let provider = self.providers.active().ok_or_else(|| {
            GenerateError::Unconfigured("no active AI configuration, add one first".into())
        })?;
        if provider.api_key.trim().is_empty() || provider.api_base_url.trim().is_empty() {
            return Err(GenerateError::Unconfigured(format!(
                "AI configuration '{}' is missing an API key or base URL",
                provider.name
            )));
        }
        Ok(provider)
    }

    fn effective_model(&self, requested: Option<&str>, provider: &ProviderConfig) -> String {
        non_empty(requested)
            .or_else(|| non_empty(Some(provider.model_name.as_str())))
            .unwrap_or(self.settings.fallback_model.as_str())
            .to_string()
    }

    fn note_latest_chart(&self) {
        match find_latest(&self.charts_dir) {
            Some(chart) => info!(file = %chart.file_name, "latest chart"),
            None => debug!("no chart available after generation"),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse the generator's stdout: exactly one JSON document, which may carry
/// an `error` field reporting a failure inside the generator.
fn parse_output(stdout: &str) -> Result<Value, GenerateError> {
    let value: Value = serde_json::from_str(stdout.trim()).map_err(|e| {
        let snippet: String = stdout.chars().take(OUTPUT_SNIPPET_CHARS).collect();
        warn!(error = %e, raw = %snippet, "generator output is not valid JSON");
        GenerateError::ResultParseError {
            reason: e.to_string(),
            snippet,
        }
    })?;

    if let Some(message) = value.get("error").and_then(error_message) {
        warn!(error = %message, "generator reported an error");
        return Err(GenerateError::GenerationFailed {
            exit_code: None,
            message,
        });
    }
    Ok(value)
}

/// A set `error` field: anything but null, false, zero or an empty string.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
