//! Upload a CSV file, get summary statistics and a set of chart images back.

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use config::Config;
use error::AppError;
use services::{ChartStore, SessionStore};
use views::Views;

/// Shared by every handler.
pub struct AppState {
    pub config: Config,
    pub session: SessionStore,
    pub charts: ChartStore,
    pub views: Views,
    /// Held by uploads and by the landing-page reset so chart writes never interleave.
    pub pipeline: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        services::charts::register_fonts().map_err(AppError::Chart)?;
        let charts = ChartStore::new(&config.static_dir, &config.upload_dir);
        Ok(Self {
            session: SessionStore::new(),
            charts,
            views: Views::new()?,
            pipeline: Mutex::new(()),
            config,
        })
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(state.charts.static_root());
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(state.config.max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
