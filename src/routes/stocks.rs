use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{SearchParams, Stock};
use crate::services::catalog_service::{AnnotatedStock, CatalogEvent, CatalogState};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fetch_catalog))
        .route("/annotated", get(fetch_annotated_catalog))
        .route("/search", get(search_stocks))
        .route("/state", get(get_state))
        .route("/events", get(stream_events))
}

#[derive(Debug, Serialize)]
pub struct CatalogStateResponse {
    pub state: CatalogState,
    pub generation: Option<u64>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stock_count: usize,
}

pub async fn fetch_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<Stock>>, AppError> {
    info!("GET /stocks - Fetching catalog");
    let stocks = state.catalog.fetch_catalog().await?;
    Ok(Json(stocks))
}

/// Catalog with each row flagged as favorite or not, in one round trip.
pub async fn fetch_annotated_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnotatedStock>>, AppError> {
    info!("GET /stocks/annotated - Fetching catalog with favorite flags");
    let stocks = state.catalog.fetch_catalog().await?;
    let annotated = state.catalog.annotate_favorites(stocks).await?;
    Ok(Json(annotated))
}

pub async fn search_stocks(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Stock>>, AppError> {
    info!("GET /stocks/search?q={} - Searching catalog", params.q);
    let results = state.catalog.search_snapshot(&params.q).await?;
    Ok(Json(results))
}

pub async fn get_state(State(state): State<AppState>) -> Json<CatalogStateResponse> {
    let snapshot = state.catalog.snapshot();
    Json(CatalogStateResponse {
        state: state.catalog.state(),
        generation: snapshot.as_ref().map(|s| s.generation),
        fetched_at: snapshot.as_ref().map(|s| s.fetched_at),
        stock_count: snapshot.map(|s| s.stocks.len()).unwrap_or(0),
    })
}

pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("GET /stocks/events - Subscribing to catalog events");
    let rx = state.catalog.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok::<_, Infallible>(to_sse(&event)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} catalog events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_sse(event: &CatalogEvent) -> Event {
    let name = match event {
        CatalogEvent::Loaded { .. } => "loaded",
        CatalogEvent::Failed { .. } => "failed",
    };
    Event::default()
        .event(name)
        .json_data(event)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
