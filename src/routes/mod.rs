use crate::models::AppState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Request, Response, StatusCode};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::Any;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

mod admin;
mod public;

pub fn init(state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(|_request: &Request<axum::body::Body>| tracing::debug_span!("http-request"))
        .on_request(|request: &Request<axum::body::Body>, _span: &Span| {
            tracing::debug!("started {} {}", request.method(), request.uri().path())
        })
        .on_response(
            |_response: &Response<axum::body::Body>, latency: Duration, _span: &Span| {
                tracing::debug!("response generated in {:?}", latency)
            },
        )
        .on_body_chunk(|chunk: &Bytes, _latency: Duration, _span: &Span| {
            tracing::debug!("sending {} bytes", chunk.len())
        })
        .on_eos(
            |_trailers: Option<&HeaderMap>, stream_duration: Duration, _span: &Span| {
                tracing::debug!("stream closed after {:?}", stream_duration)
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                tracing::error!("something went wrong: {error:?} latency: {latency:?}")
            },
        );
    let uploads = ServeDir::new(state.upload_dir.clone());
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/public", public::init(state.clone()))
        .nest("/api/admin", admin::init(state))
        .nest_service("/uploads", uploads)
        .layer(trace)
        // Generous enough for a manual rate refresh, which waits on both
        // upstream providers.
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok").into_response()
}
