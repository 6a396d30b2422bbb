//! HTTP API server for the recommendation pipeline.
//!
//! The caller is another backend service, so the surface is deliberately small:
//! one recommendation endpoint and a health check.

use super::build_pipeline;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::RagError;
use crate::recommend::{IngredientQuery, RecommendationPipeline};
use crate::vector_store::open_store;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state.
pub struct AppState {
    pipeline: RecommendationPipeline,
}

impl AppState {
    pub fn new(pipeline: RecommendationPipeline) -> Self {
        Self { pipeline }
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/recommend/ai", post(recommend_ai))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let store = open_store(&settings)?;
    if store.document_count().await? == 0 {
        warn!("Recipe index is empty; run `eateum-rag ingest <csv>` first");
    }

    let pipeline = build_pipeline(&settings, store)?;
    let pipeline_config = pipeline.config().clone();
    let state = Arc::new(AppState::new(pipeline));
    let app = router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("eateum-rag API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Recommend", "POST /recommend/ai");
    println!();
    Output::kv("Over-fetch", &pipeline_config.overfetch_size.to_string());
    Output::kv("Top N", &pipeline_config.top_n.to_string());
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

// === Request/Response Types ===

#[derive(Serialize)]
struct RecommendResponse {
    recipe_ids: Vec<i64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

fn invalid_request(status: StatusCode, details: Vec<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: "invalid request".to_string(),
            details,
        }),
    )
        .into_response()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract the ingredient list, collecting every validation failure.
fn parse_ingredients(payload: &Value) -> Result<Vec<String>, Vec<String>> {
    let Some(body) = payload.as_object() else {
        return Err(vec![format!("body: expected an object, got {}", json_type(payload))]);
    };

    match body.get("ingredients") {
        None => Err(vec!["ingredients: field required".to_string()]),
        Some(Value::Array(items)) => {
            let mut ingredients = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => ingredients.push(s.clone()),
                    other => errors.push(format!(
                        "ingredients[{}]: expected a string, got {}",
                        i,
                        json_type(other)
                    )),
                }
            }
            if errors.is_empty() {
                Ok(ingredients)
            } else {
                Err(errors)
            }
        }
        Some(other) => Err(vec![format!(
            "ingredients: expected a list of strings, got {}",
            json_type(other)
        )]),
    }
}

fn error_status(err: &RagError) -> StatusCode {
    match err {
        RagError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_retrieval() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn recommend_ai(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let details = vec![format!("body: invalid JSON ({})", e)];
            return invalid_request(StatusCode::BAD_REQUEST, details);
        }
    };

    let ingredients = match parse_ingredients(&payload) {
        Ok(ingredients) => ingredients,
        Err(details) => return invalid_request(StatusCode::UNPROCESSABLE_ENTITY, details),
    };

    let query = IngredientQuery::new(ingredients);
    match state.pipeline.recommend(&query).await {
        Ok(recommendation) => Json(RecommendResponse {
            recipe_ids: recommendation.into_ids(),
        })
        .into_response(),
        Err(e) => {
            error!("Recommendation failed: {}", e);
            (
                error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                    details: Vec::new(),
                }),
            )
                .into_response()
        }
    }
}
