use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use termspace_core::{
    DocId, EngineError, IndexHandle, IndexStore, MemoryStore, SearchIndex, SledStore,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Serve an index previously built into a sled directory by the indexer.
    pub fn open(index_dir: &str) -> Result<Self> {
        let store: Arc<dyn IndexStore> = Arc::new(SledStore::open(index_dir)?);
        Ok(Self::with_index(SearchIndex::open(store)))
    }

    /// Serve a pre-assembled index (tests, in-memory deployments).
    pub fn with_index(index: SearchIndex) -> Self {
        Self {
            index: Arc::new(IndexHandle::new(index)),
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
        }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHitBody>,
}

#[derive(Serialize)]
pub struct SearchHitBody {
    pub doc_id: DocId,
    pub score: f64,
    pub content: String,
}

#[derive(Deserialize)]
pub struct RebuildDoc {
    pub id: DocId,
    pub text: String,
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let snapshot = state.index.snapshot();
    let hits = snapshot.search(&params.q).map_err(engine_status)?;

    let k = params.k.clamp(1, 100);
    let total_hits = hits.len();
    let results = hits
        .into_iter()
        .take(k)
        .map(|h| SearchHitBody {
            doc_id: h.doc_id,
            score: h.score,
            content: h.content,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let snapshot = state.index.snapshot();
    match snapshot.document(doc_id).map_err(engine_status)? {
        Some(content) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "content": content,
        }))),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

/// Rebuild the whole index from the posted document set and publish the new
/// generation atomically. In-flight searches keep reading the snapshot they
/// pinned.
pub async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(docs): Json<Vec<RebuildDoc>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;

    let corpus: Vec<(DocId, String)> = docs.into_iter().map(|d| (d.id, d.text)).collect();
    let store: Arc<dyn IndexStore> = Arc::new(MemoryStore::new());
    let (index, stats) = SearchIndex::build(store, &corpus).map_err(engine_status)?;
    state.index.publish(index);
    tracing::info!(indexed = stats.indexed, rejected = stats.rejected, "published new index");

    Ok(Json(serde_json::json!({
        "indexed": stats.indexed,
        "rejected": stats.rejected,
        "terms": stats.terms,
    })))
}

fn engine_status(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidDocument { .. } => StatusCode::BAD_REQUEST,
        EngineError::NotFound { .. } | EngineError::InternalInvariantViolation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
