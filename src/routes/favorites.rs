use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{FavoriteStatusResponse, Stock};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/:symbol", get(get_favorite_status).delete(remove_favorite))
}

pub async fn list_favorites(
    State(state): State<AppState>,
) -> Result<Json<Vec<Stock>>, AppError> {
    info!("GET /favorites - Listing favorites");
    let favorites = state.catalog.list_favorites().await?;
    Ok(Json(favorites))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Json(stock): Json<Stock>,
) -> Result<StatusCode, AppError> {
    info!("POST /favorites - Adding {}", stock.symbol);
    if stock.symbol.trim().is_empty() {
        return Err(AppError::Validation("symbol must not be empty".to_string()));
    }
    state.catalog.add_favorite(&stock).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /favorites/{} - Removing favorite", symbol);
    state.catalog.remove_favorite_by_symbol(&symbol).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_favorite_status(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<FavoriteStatusResponse> {
    let is_favorite = state.catalog.is_favorite(&symbol).await;
    Json(FavoriteStatusResponse { symbol, is_favorite })
}
