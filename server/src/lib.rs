use anyhow::{Context, Result};
use axum::{extract::{Query, State}, response::Html, routing::get, Json, Router};
use postsearch_core::persist::IndexPaths;
use postsearch_core::{DocId, Normalizer, RankedHit, SearchEngine, View};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    /// Overrides the configured top-K.
    pub k: Option<usize>,
    #[serde(default)]
    pub view: View,
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<RankedHit>,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub documents: Vec<DocId>,
}

/// Where to find the indexer's artifacts and how to answer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub index_dir: PathBuf,
    pub references: PathBuf,
    /// Morphology table; must be the one the index was built with.
    pub dictionary: PathBuf,
    /// `None` returns every scored document.
    pub top_k: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub top_k: Option<usize>,
}

/// Load every artifact, then build the router. Nothing is served if loading fails.
pub fn build_app(config: &AppConfig) -> Result<Router> {
    let normalizer = Normalizer::from_dictionary(&config.dictionary).context("loading morphology dictionary")?;
    let paths = IndexPaths::new(&config.index_dir);
    let engine = SearchEngine::load(&paths, &config.references, normalizer)?;
    Ok(router(Arc::new(engine), config.top_k))
}

pub fn router(engine: Arc<SearchEngine>, top_k: Option<usize>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .with_state(AppState { engine, top_k })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = Instant::now();
    let mut results = state.engine.search(&params.query, params.view, None);
    let total_hits = results.len();
    if let Some(k) = params.k.or(state.top_k) {
        results.truncate(k);
    }
    tracing::debug!(query = %params.query, view = %params.view, total_hits, "ranked search");
    Json(SearchResponse { query: params.query, took_s: start.elapsed().as_secs_f64(), total_hits, results })
}

pub async fn boolean_handler(State(state): State<AppState>, Query(params): Query<BooleanParams>) -> Json<BooleanResponse> {
    let start = Instant::now();
    let documents: Vec<DocId> = state.engine.boolean(&params.query).into_iter().collect();
    tracing::debug!(query = %params.query, total_hits = documents.len(), "boolean search");
    Json(BooleanResponse {
        query: params.query,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: documents.len(),
        documents,
    })
}
