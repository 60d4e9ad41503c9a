//! Read-only storefront endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::conversion;
use crate::models::{AppState, CalculateRequest, PageQuery};
use crate::AppError;

pub fn init(state: AppState) -> Router {
    Router::new()
        .route("/rates", get(rates))
        .route("/products", get(products))
        .route("/trades", get(trades))
        .route("/contents", get(contents))
        .route("/contents/{key}", get(content))
        .route("/cards", get(cards))
        .route("/carousels", get(carousels))
        .route("/company-images", get(company_images))
        .route("/videos", get(videos))
        .route("/social-buttons", get(social_buttons))
        .route("/conversion-config", get(conversion_config))
        .route("/calculate", post(calculate))
        .with_state(state)
}

async fn rates(State(state): State<AppState>) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.rates.get_all().await?))
}

async fn products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> crate::Result<impl axum::response::IntoResponse> {
    let (page, limit) = query.resolve();
    Ok(Json(state.catalog.products_page(page, limit, true).await?))
}

/// Only completed trades are shown on the storefront ticker.
async fn trades(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> crate::Result<impl axum::response::IntoResponse> {
    let (page, limit) = query.resolve();
    Ok(Json(
        state
            .catalog
            .trades_page(page, limit, Some("completed"))
            .await?,
    ))
}

async fn contents(
    State(state): State<AppState>,
) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.contents().await?))
}

async fn content(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> crate::Result<impl axum::response::IntoResponse> {
    let content = state
        .catalog
        .content_by_key(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("content".to_string()))?;
    Ok(Json(content))
}

async fn cards(State(state): State<AppState>) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.cards(true).await?))
}

async fn carousels(
    State(state): State<AppState>,
) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.carousels(true).await?))
}

async fn company_images(
    State(state): State<AppState>,
) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.company_images(true).await?))
}

async fn videos(State(state): State<AppState>) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.videos(true).await?))
}

async fn social_buttons(
    State(state): State<AppState>,
) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.catalog.social_buttons(true).await?))
}

async fn conversion_config(
    State(state): State<AppState>,
) -> crate::Result<impl axum::response::IntoResponse> {
    Ok(Json(state.conversion.get().await?))
}

/// Live payout preview for the storefront calculator; same formula the
/// admin preview uses.
async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> crate::Result<impl axum::response::IntoResponse> {
    let config = state.conversion.get().await?;
    Ok(Json(conversion::calculate(&config, &request)?))
}
