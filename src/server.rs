use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::adapter::{PipelineResult, RecipeAdapter, RestrictionSet};
use crate::prompts::PromptSet;
use crate::ratings::{Rating, RatingError, RatingStore, RatingSummary};
use crate::samples::resolve_recipe_text;
use crate::verdict::VerdictPolicy;

/// Frontend dev servers allowed to call the API from a browser.
const ALLOWED_ORIGINS: [&str; 6] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<RecipeAdapter>,
    pub ratings: Arc<RatingStore>,
    pub prompts_dir: PathBuf,
    pub api_key_env_var: String,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::InvalidStars(_) | RatingError::EmptyRecipeName => {
                AppError::bad_request(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "rating store failure");
                AppError::internal(other)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub dish_name: String,
    #[serde(default)]
    pub original_recipe: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipeResponse {
    pub original_recipe: String,
    pub vegetarian_recipe: String,
    pub restrictions: Vec<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub recipe_name: String,
    pub stars: u8,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PipelineInfo {
    pub model: String,
    pub max_retries: u32,
    pub stage_timeout_secs: u64,
    pub filter_policy: VerdictPolicy,
    pub verify_policy: VerdictPolicy,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub working_directory: String,
    pub api_key_set: bool,
    pub context_files: BTreeMap<String, bool>,
    pub pipeline: PipelineInfo,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState, static_dir: &FsPath) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/generate-recipe", post(generate_recipe))
        .route("/api/health", get(health_check))
        .route("/api/debug", get(debug_info))
        .route("/api/ratings", get(list_ratings).post(submit_rating))
        .route("/api/ratings/{recipe_name}", get(get_rating))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .map(|&origin| HeaderValue::from_static(origin))
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, static_dir: &FsPath, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state, static_dir);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("recipe-adapt listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("recipe-adapt shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_recipe(
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let dish_name = request.dish_name.trim();
    if dish_name.is_empty() {
        return Err(AppError::bad_request("Please provide a dish name"));
    }

    let original_recipe = resolve_recipe_text(dish_name, &request.original_recipe);
    let restrictions = RestrictionSet::with_default(request.filters);
    tracing::info!(
        dish = dish_name,
        restrictions = %restrictions.joined(),
        "received recipe adaptation request"
    );

    let response = match state.adapter.adapt(&original_recipe, &restrictions).await {
        PipelineResult::Success(recipe) => RecipeResponse {
            original_recipe,
            vegetarian_recipe: recipe,
            restrictions: restrictions.labels().to_vec(),
            success: true,
            error_message: None,
        },
        PipelineResult::Failure(reason) => RecipeResponse {
            original_recipe,
            vegetarian_recipe: String::new(),
            restrictions: restrictions.labels().to_vec(),
            success: false,
            error_message: Some(reason.user_message()),
        },
    };
    Ok(Json(response))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Recipe adaptation API is running",
    })
}

async fn debug_info(State(state): State<AppState>) -> Json<DebugResponse> {
    let working_directory = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let api_key_set =
        std::env::var(&state.api_key_env_var).is_ok_and(|key| !key.trim().is_empty());
    let context_files = PromptSet::check_files(&state.prompts_dir)
        .into_iter()
        .map(|(path, exists)| (path.display().to_string(), exists))
        .collect();

    let config = state.adapter.config();
    Json(DebugResponse {
        working_directory,
        api_key_set,
        context_files,
        pipeline: PipelineInfo {
            model: config.model.clone(),
            max_retries: config.max_retries,
            stage_timeout_secs: config.stage_timeout.as_secs(),
            filter_policy: config.filter_policy,
            verify_policy: config.verify_policy,
        },
    })
}

async fn submit_rating(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    let rating = state
        .ratings
        .submit(&request.recipe_name, request.stars)
        .await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

async fn list_ratings(State(state): State<AppState>) -> Result<Json<Vec<RatingSummary>>, AppError> {
    Ok(Json(state.ratings.summaries().await?))
}

async fn get_rating(
    State(state): State<AppState>,
    Path(recipe_name): Path<String>,
) -> Result<Json<RatingSummary>, AppError> {
    Ok(Json(state.ratings.summary(&recipe_name).await?))
}
