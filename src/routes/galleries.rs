use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{error::AppError, services::ChartKind, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/histograms", get(histograms))
        .route("/box_plots", get(box_plots))
        .route("/correlation_matrix", get(correlation_matrix))
        .route("/bar_plots", get(bar_plots))
}

#[derive(Debug, Serialize)]
struct GalleryImage {
    url: String,
    caption: String,
}

#[derive(Debug, Serialize)]
struct GalleryPage {
    page_title: &'static str,
    images: Vec<GalleryImage>,
}

async fn histograms(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    gallery(&state, ChartKind::Histogram).await
}

async fn box_plots(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    gallery(&state, ChartKind::BoxPlot).await
}

async fn correlation_matrix(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    gallery(&state, ChartKind::Correlation).await
}

async fn bar_plots(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    gallery(&state, ChartKind::Bar).await
}

/// Lists whatever is on disk for `kind`, not the session's manifest.
async fn gallery(state: &AppState, kind: ChartKind) -> Result<Response, AppError> {
    let charts = state.charts.clone();
    let listing = tokio::task::spawn_blocking(move || charts.list(kind)).await??;

    let Some(files) = listing else {
        tracing::warn!("Gallery directory for {} is missing", kind.dir_name());
        return Ok(missing_directory_message(kind).into_response());
    };

    let images = files
        .into_iter()
        .map(|file| GalleryImage {
            url: format!("/static/{}/{}", kind.dir_name(), urlencoding::encode(&file)),
            caption: file.strip_suffix(".png").unwrap_or(&file).to_string(),
        })
        .collect();

    let page = GalleryPage {
        page_title: kind.title(),
        images,
    };
    Ok(state.views.render("gallery", &page)?.into_response())
}

fn missing_directory_message(kind: ChartKind) -> String {
    format!("The {} directory does not exist.", kind.title().to_lowercase())
}
