//! HTTP routes for the `/reduction` API.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use neuromem::{preprocess, DynNeuralMemory, MemoryStats, Payload, TaskId};

use crate::metrics::{record_request, record_save};
use crate::tensor::NetTensor;
use crate::Result;

/// Shared handler state
pub type AppState = DynNeuralMemory<i64>;

/// Build the application router
pub fn router(memory: AppState) -> Router {
    Router::new()
        .route("/reduction/save", post(save))
        .route("/reduction/get", get(get_values))
        .route("/reduction/nearby", get(nearby))
        .route("/reduction/range", get(range))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(memory)
}

// ── Request / response bodies ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub key: i64,
    pub tensor: NetTensor,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub key_from: i64,
    pub key_to_exclude: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyedTensor {
    pub key: i64,
    pub tensor: NetTensor,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub values: Vec<KeyedTensor>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub center: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NearbyResponse {
    pub center: i64,
    pub neighbor: Option<KeyedTensor>,
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeResponse {
    pub values: Vec<NetTensor>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Queue a store; returns before training runs.
async fn save(
    State(memory): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<impl IntoResponse> {
    record_request("save");

    let tensor = request.tensor.normalize()?;
    let payload = Payload::Buffer(tensor.data);

    // Reject non-byte values now rather than inside the background task
    preprocess(&payload, memory.cache().input_size())?;

    record_save(payload.len());
    let task_id = memory.save(request.key, payload);
    debug!("Queued key {} as task {}", request.key, task_id);

    Ok((StatusCode::ACCEPTED, Json(SaveResponse { task_id })))
}

async fn get_values(
    State(memory): State<AppState>,
    Query(params): Query<GetParams>,
) -> Result<Json<GetResponse>> {
    record_request("get");

    let values = memory
        .get_range(&params.key_from, params.key_to_exclude.as_ref())?
        .into_iter()
        .map(|(key, bytes)| KeyedTensor {
            key,
            tensor: NetTensor::from_bytes(&bytes),
        })
        .collect();

    Ok(Json(GetResponse { values }))
}

async fn nearby(
    State(memory): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResponse>> {
    record_request("nearby");

    let neighbor = match memory.nearby(&params.center) {
        Some(key) => memory
            .retrieve(&key)?
            .map(|bytes| KeyedTensor {
                key,
                tensor: NetTensor::from_bytes(&bytes),
            }),
        None => None,
    };

    Ok(Json(NearbyResponse {
        center: params.center,
        neighbor,
    }))
}

async fn range(
    State(memory): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeResponse>> {
    record_request("range");

    let values = memory
        .nearby_range(&params.from, &params.to)?
        .iter()
        .map(|bytes| NetTensor::from_bytes(bytes))
        .collect();

    Ok(Json(RangeResponse { values }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats(State(memory): State<AppState>) -> Json<MemoryStats> {
    Json(memory.stats())
}
