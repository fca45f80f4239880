/*
newsdigest - main.rs
This binary loads configuration once, builds the headline and generative-model
clients, and serves the JSON API with Rocket.
*/

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use common::Config;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsdigest::llm;
use newsdigest::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "newsdigest", about = "Personalized news digest server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // A missing .env is normal outside local development
    if let Err(e) = dotenv::dotenv() {
        info!(%e, "no .env file loaded");
    }

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");
    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let mut config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    config.apply_env();
    config.validate()?;
    info!(default = ?default_path, override = ?override_path, source = ?config.source, "configuration loaded");

    match config.news_api_key() {
        Some(key) => info!("Initializing news service with API key: {}", common::mask_secret(key)),
        None => {
            warn!("NEWS_API_KEY is not set! News functionality will not work.");
            warn!("Get your free API key from: https://newsapi.org/register");
        }
    }

    let llm_provider = match config.llm.as_ref().map(llm::provider_from_config) {
        Some(Ok(Some(provider))) => {
            info!(model = provider.model(), "Generative model provider initialized");
            Some(provider)
        }
        Some(Ok(None)) | None => {
            warn!("No generative model configured. AI content generation will use fallback.");
            None
        }
        Some(Err(e)) => {
            warn!(%e, "Generative model unavailable. AI content generation will use fallback.");
            None
        }
    };

    let state = AppState::new(Arc::new(config), llm_provider)?;
    if let Err(e) = server::launch_rocket(state).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
