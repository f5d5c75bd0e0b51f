use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

pub mod galleries;
pub mod pages;
pub mod upload;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .merge(pages::routes())
        .merge(upload::routes())
        .merge(galleries::routes())
}

async fn health_check() -> &'static str {
    "OK"
}
