use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::response::{status, Redirect};
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Request, Rocket, State};
use serde::{Deserialize, Serialize};
use rand::RngCore;
use tracing::{error, info, warn};

use common::topics as catalog;
use common::{Config, ConfigSource};

use crate::llm::{synthesis, LlmProvider};
use crate::models::{Article, SynthesisRequest, SynthesisResult};
use crate::news::NewsClient;

const SELECTION_COOKIE: &str = "selection";

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub news: NewsClient,
    pub llm_provider: Option<Arc<dyn LlmProvider>>,
    /// Base64 key for private cookies
    session_secret: String,
}

impl AppState {
    pub fn new(config: Arc<Config>, llm_provider: Option<Arc<dyn LlmProvider>>) -> Result<Self> {
        let news = NewsClient::from_config(&config).context("failed to build headlines client")?;
        let session_secret = match config.session_secret()? {
            Some(secret) => secret,
            None => {
                warn!("SECRET_KEY not set; sessions will not survive a restart");
                random_secret()
            }
        };
        Ok(Self {
            started_at: Utc::now(),
            config,
            news,
            llm_provider,
            session_secret,
        })
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

/// Topic and country choices offered to the user.
#[derive(Serialize)]
struct CatalogResponse {
    categories: &'static [catalog::Category],
    countries: &'static [catalog::Country],
}

/// Topics and country remembered for the current browser session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub topics: Vec<String>,
    pub country: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    news_api_configured: bool,
    llm_model: Option<String>,
}

/// Response for `/api/news`.
#[derive(Serialize)]
struct NewsResponse {
    status: &'static str,
    articles: Vec<Article>,
    total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self { status: "error", message: message.into() }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum GenerateResponse {
    Generated(SynthesisResult),
    Rejected(ErrorBody),
}

#[derive(Serialize)]
struct DebugConfigResponse {
    news_api_key_set: bool,
    news_api_key_length: usize,
    news_api_base_url: String,
    llm_adapter: String,
    llm_configured: bool,
    config_source: ConfigSource,
}

fn read_selection(jar: &CookieJar<'_>) -> Option<Selection> {
    jar.get_private(SELECTION_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
}

/// Topic selection data.
#[get("/")]
fn index() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        categories: catalog::CATEGORIES,
        countries: catalog::COUNTRIES,
    })
}

#[get("/preferences")]
fn preferences() -> Json<CatalogResponse> {
    index()
}

#[get("/health")]
fn health() -> &'static str {
    "OK"
}

#[get("/api/status")]
fn api_status(state: &State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        news_api_configured: state.news.is_configured(),
        llm_model: state.llm_provider.as_ref().map(|p| p.model().to_string()),
    })
}

/// Remember the chosen topics in the session; with no topics go back to the picker.
#[get("/news-feed?<topics>&<country>")]
fn news_feed(
    topics: Vec<String>,
    country: Option<String>,
    jar: &CookieJar<'_>,
) -> Result<Json<Selection>, Redirect> {
    if topics.is_empty() {
        return Err(Redirect::to("/"));
    }

    let selection = Selection {
        topics,
        country: catalog::resolve_country(country.as_deref()).to_string(),
    };
    match serde_json::to_string(&selection) {
        Ok(value) => jar.add_private(Cookie::new(SELECTION_COOKIE, value)),
        Err(e) => error!(%e, "failed to encode session selection"),
    }
    Ok(Json(selection))
}

#[get("/api/session")]
fn session_selection(jar: &CookieJar<'_>) -> Json<Selection> {
    Json(read_selection(jar).unwrap_or_default())
}

/// Fetch headlines for each requested topic.
#[get("/api/news?<topics>&<country>")]
async fn get_news(
    state: &State<AppState>,
    topics: Vec<String>,
    country: Option<String>,
) -> Json<NewsResponse> {
    let country = catalog::resolve_country(country.as_deref());

    let batch = match state
        .news
        .fetch(&topics, country, state.config.news_page_size())
        .await
    {
        Ok(batch) => batch,
        Err(e) => {
            error!(%e, "headline fetch rejected");
            return Json(NewsResponse {
                status: "error",
                articles: Vec::new(),
                total: 0,
                errors: Vec::new(),
                message: Some(e.to_string()),
            });
        }
    };

    let message = (batch.articles.is_empty() && batch.errors.is_empty())
        .then(|| "No articles found for the selected topics".to_string());
    info!("Returning {} total articles", batch.articles.len());

    Json(NewsResponse {
        status: if batch.articles.is_empty() { "error" } else { "ok" },
        total: batch.articles.len(),
        articles: batch.articles,
        errors: batch.errors,
        message,
    })
}

/// Generate personalized content from the selected articles.
#[post("/generate-content", data = "<body>")]
async fn generate_content(
    state: &State<AppState>,
    body: Json<SynthesisRequest>,
) -> Json<GenerateResponse> {
    let request = body.into_inner();
    if request.articles.is_empty() {
        return Json(GenerateResponse::Rejected(ErrorBody::new("No articles selected")));
    }

    let result = synthesis::synthesize(
        state.llm_provider.as_deref(),
        &request.articles,
        request.preferences.as_deref(),
    )
    .await;
    Json(GenerateResponse::Generated(result))
}

#[get("/debug/config")]
fn debug_config(state: &State<AppState>) -> Json<DebugConfigResponse> {
    let cfg = &state.config;
    let key = cfg.news_api_key();
    Json(DebugConfigResponse {
        news_api_key_set: key.is_some(),
        news_api_key_length: key.map(str::len).unwrap_or(0),
        news_api_base_url: cfg.news_base_url().to_string(),
        llm_adapter: cfg
            .llm
            .as_ref()
            .map(|l| l.adapter().to_string())
            .unwrap_or_else(|| "none".to_string()),
        llm_configured: state.llm_provider.is_some(),
        config_source: cfg.source,
    })
}

#[catch(400)]
fn bad_request() -> status::Custom<Json<ErrorBody>> {
    status::Custom(Status::BadRequest, Json(ErrorBody::new("Bad request")))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> status::Custom<Json<ErrorBody>> {
    status::Custom(
        Status::NotFound,
        Json(ErrorBody::new(format!("Page not found: {}", req.uri()))),
    )
}

#[catch(422)]
fn unprocessable() -> status::Custom<Json<ErrorBody>> {
    status::Custom(
        Status::UnprocessableEntity,
        Json(ErrorBody::new("Request body is not valid JSON for this endpoint")),
    )
}

#[catch(500)]
fn internal_error() -> status::Custom<Json<ErrorBody>> {
    status::Custom(
        Status::InternalServerError,
        Json(ErrorBody::new("Internal server error")),
    )
}

/// Build the Rocket instance with managed state, routes and catchers.
/// Bind address, port, log level and the cookie secret come from the application config.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let cfg = state.config.clone();
    let mut fig = rocket::Config::figment()
        .merge(("address", cfg.server_bind().to_string()))
        .merge(("port", cfg.server_port()))
        .merge(("secret_key", state.session_secret.clone()));
    if cfg.debug() {
        fig = fig.merge(("log_level", "debug"));
    }

    rocket::custom(fig)
        .manage(state)
        .mount(
            "/",
            routes![
                index,
                preferences,
                health,
                api_status,
                news_feed,
                session_selection,
                get_news,
                generate_content,
                debug_config,
            ],
        )
        .register("/", catchers![bad_request, not_found, unprocessable, internal_error])
}

pub async fn launch_rocket(state: AppState) -> Result<()> {
    // Launch Rocket - this will run until shutdown (SIGINT/SIGTERM etc.)
    info!("Starting Rocket HTTP server");
    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    info!("Rocket HTTP server has shut down");
    Ok(())
}
