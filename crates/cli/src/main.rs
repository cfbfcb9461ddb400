mod telemetry;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::info,
};

use {
    tabula_config::TabulaConfig, tabula_gateway::GatewayState, tabula_generator::GenerateRequest,
    tabula_history::HistoryStore, tabula_providers::ProviderStore,
};

#[derive(Parser)]
#[command(name = "tabula", about = "Tabula: ask questions about your data in plain language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of discovering one.
    #[arg(long, global = true, env = "TABULA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one analysis request and print the result.
    Generate {
        #[arg(short, long)]
        query: String,
        /// Data file to analyse. It is copied first; the original is kept.
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        preference: Option<String>,
    },
    /// Analysis history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// AI provider configurations.
    Providers {
        #[command(subcommand)]
        action: ProviderAction,
    },
    /// Probe a running server's health endpoint.
    Health {
        /// Full health URL; defaults to the configured bind address.
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Clear,
}

#[derive(Subcommand)]
enum ProviderAction {
    List,
    SetActive { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let discovered = tabula_config::load_or_discover(cli.config.as_deref())?;
    let _log_guard =
        telemetry::init(&cli.log_level, cli.json_logs, &discovered.config.storage.logs_dir);

    info!(version = env!("CARGO_PKG_VERSION"), "tabula starting");
    discovered.report();
    let config = discovered.config;

    match cli.command {
        Commands::Serve { bind, port } => serve(config, bind, port).await,
        Commands::Generate {
            query,
            file,
            model,
            preference,
        } => generate(&config, query, file, model, preference).await,
        Commands::History { action } => history(&config, action),
        Commands::Providers { action } => providers(&config, action),
        Commands::Health { url } => health(&config, url).await,
    }
}

async fn serve(
    mut config: TabulaConfig,
    bind: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    tabula_gateway::start_gateway(config).await
}

async fn generate(
    config: &TabulaConfig,
    query: String,
    file: Option<PathBuf>,
    model: Option<String>,
    preference: Option<String>,
) -> anyhow::Result<()> {
    let state = GatewayState::from_config(config);
    state.ensure_dirs();

    let file = match file {
        Some(path) => Some(
            state
                .uploads
                .import(&path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let result = state
        .generator
        .generate(GenerateRequest {
            query,
            file,
            model,
            preference,
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn history(config: &TabulaConfig, action: HistoryAction) -> anyhow::Result<()> {
    let store = HistoryStore::new(config.storage.history_path());
    match action {
        HistoryAction::List => {
            println!("{}", serde_json::to_string_pretty(&store.load())?);
        },
        HistoryAction::Clear => {
            store.clear();
            println!("history cleared");
        },
    }
    Ok(())
}

fn providers(config: &TabulaConfig, action: ProviderAction) -> anyhow::Result<()> {
    let store = ProviderStore::new(config.storage.providers_path());
    match action {
        ProviderAction::List => {
            let doc = store.load();
            if doc.configurations.is_empty() {
                println!("no AI configurations");
            }
            for cfg in &doc.configurations {
                let marker = if cfg.is_active { "*" } else { " " };
                println!(
                    "{marker} {}  {}  {}  {}",
                    cfg.id, cfg.name, cfg.model_name, cfg.api_base_url
                );
            }
        },
        ProviderAction::SetActive { id } => {
            let (cfg, _) = store.set_active(&id)?;
            println!("active configuration: {} ({})", cfg.name, cfg.id);
        },
    }
    Ok(())
}

async fn health(config: &TabulaConfig, url: Option<String>) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| {
        format!(
            "http://{}:{}/api/health",
            config.server.bind, config.server.port
        )
    });
    let resp = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {url}"))?;
    let status = resp.status();
    let body = resp.text().await?;
    println!("{body}");
    anyhow::ensure!(status.is_success(), "health check returned {status}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["tabula", "serve", "--port", "4000"]).unwrap();
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, None);
                assert_eq!(port, Some(4000));
            },
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_generate_with_globals() {
        let cli = Cli::try_parse_from([
            "tabula",
            "generate",
            "--query",
            "total sales",
            "--file",
            "sales.csv",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Generate { query, file, .. } => {
                assert_eq!(query, "total sales");
                assert_eq!(file, Some(PathBuf::from("sales.csv")));
            },
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn history_clear_empties_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TabulaConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        let store = HistoryStore::new(config.storage.history_path());
        store.append(serde_json::json!({ "code": "x" }));

        history(&config, HistoryAction::Clear).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn set_active_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TabulaConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        let err = providers(&config, ProviderAction::SetActive { id: "nope".into() });
        assert!(err.is_err());
    }
}
