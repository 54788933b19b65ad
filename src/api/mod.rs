mod dispatch;
mod error;
mod messages;
mod payload;

use axum::{
    Json, Router,
    extract::{Query, rejection::JsonRejection, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use dispatch::{Execution, dispatch};
pub use error::{ApiError, ApiResult};
pub use messages::{WorkerMessage, WorkerRequest};
pub use payload::{
    CliDemandDistribution, DemandPayload, RunArgs, RunParams, SimulatePayload,
    run_args_from_payload,
};

pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/messages", post(message_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "cash-flow risk API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    let mut response = ApiError::BadRequest("no such route".to_string()).into_response();
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> ApiResult<Response> {
    let args = run_args_from_payload(payload);
    let result = Execution::Offloaded.run(args).await?;
    Ok(json_response(StatusCode::OK, WorkerMessage::completed(result)))
}

async fn message_handler(
    request: Result<Json<WorkerRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let message = dispatch(request, Execution::Offloaded).await?;
    Ok(json_response(StatusCode::OK, message))
}

pub(crate) fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
