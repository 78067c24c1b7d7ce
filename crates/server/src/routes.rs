//! HTTP routes.
//!
//! - `GET /podcast/:id`: feed document by name or numeric id
//! - `GET /`, `GET /index`: JSON listing of configured feeds

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::feed::FeedMemo;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<FeedMemo>,
}

/// One row of the feed index.
#[derive(Debug, Serialize)]
pub struct FeedSummary {
    pub name: String,
    pub id: u32,
    pub url: String,
    pub title: String,
    pub path: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index", get(index))
        .route("/podcast/:id", get(podcast))
        .with_state(state)
}

async fn podcast(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let name = state
        .feeds
        .service()
        .registry()
        .resolve(&id)
        .map(|meta| meta.name.clone())
        .ok_or_else(|| ApiError::NotFound(format!("unknown feed: {id}")))?;

    let document = state.feeds.get_feed(&name).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], document))
}

async fn index(State(state): State<AppState>) -> Json<Vec<FeedSummary>> {
    let feeds = state
        .feeds
        .service()
        .registry()
        .iter()
        .map(|meta| FeedSummary {
            name: meta.name.clone(),
            id: meta.id,
            url: meta.url.to_string(),
            title: meta.title.clone().unwrap_or_else(|| meta.name.clone()),
            path: format!("/podcast/{}", meta.name),
        })
        .collect();
    Json(feeds)
}
