use axum::{
    Router,
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::api::jsonrpc;
use crate::api::models::{NewspaperReply, NewspaperRequest, SentenceReply, SummaryReply, TextRequest};
use crate::api::response;
use crate::error::Status;
use crate::servicer::RpcReply;

pub const NEWSPAPER_PATH: &str = "/caterpillar.Caterpillar/Newspaper";
pub const SENTENCES_PATH: &str = "/caterpillar.Caterpillar/Sentences";
pub const SUMMARY_PATH: &str = "/caterpillar.Caterpillar/Summary";

/// Router for the `caterpillar.Caterpillar` service.
pub fn create_router(app_state: AppState) -> Router {
    let routes = Router::new()
        .route(NEWSPAPER_PATH, post(newspaper_handler))
        .route(SENTENCES_PATH, post(sentences_handler))
        .route(SUMMARY_PATH, post(summary_handler));
    finish_router(routes, app_state)
}

/// Router for the JSON-RPC newspaper service.
pub fn create_json_rpc_router(app_state: AppState) -> Router {
    let routes = Router::new().route("/", post(json_rpc_handler));
    finish_router(routes, app_state)
}

fn finish_router(routes: Router<AppState>, app_state: AppState) -> Router {
    routes
        .layer(middleware::from_fn_with_state(app_state.clone(), limit_workers))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Holds a worker permit for the whole call; callers queue once all are taken.
async fn limit_workers(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let Ok(_permit) = state.workers.acquire().await else {
        tracing::error!(%path, "worker pool closed");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let start_time = std::time::Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %path,
        status = response.status().as_u16(),
        elapsed = ?start_time.elapsed(),
        "call finished"
    );
    response
}

async fn newspaper_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let reply = match decode::<NewspaperRequest>(NEWSPAPER_PATH, &body) {
        Some(request) => state.servicer.newspaper(request).await,
        None => rejected::<NewspaperReply>(),
    };
    response::rpc(reply)
}

async fn sentences_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let reply = match decode::<TextRequest>(SENTENCES_PATH, &body) {
        Some(request) => state.servicer.sentences(request).await,
        None => rejected::<SentenceReply>(),
    };
    response::rpc(reply)
}

async fn summary_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let reply = match decode::<TextRequest>(SUMMARY_PATH, &body) {
        Some(request) => state.servicer.summary(request).await,
        None => rejected::<SummaryReply>(),
    };
    response::rpc(reply)
}

async fn json_rpc_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let (status, body) = jsonrpc::dispatch(&state.servicer, &body).await;
    response::json_rpc(status, body)
}

// An empty body is the empty message, as on the wire.
fn decode<T: DeserializeOwned + Default>(path: &str, body: &[u8]) -> Option<T> {
    if body.is_empty() {
        return Some(T::default());
    }
    match serde_json::from_slice(body) {
        Ok(request) => Some(request),
        Err(err) => {
            tracing::warn!(%path, error = %err, "malformed request body");
            None
        }
    }
}

fn rejected<T: Default>() -> RpcReply<T> {
    RpcReply {
        status: Status::InvalidArgument,
        message: T::default(),
    }
}
