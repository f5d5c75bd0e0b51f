use axum::{extract::State, response::Html, routing::get, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::DescribeMode,
    services::profiler,
    views::{describe_table, info_table, missing_table},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/process", get(process))
        .route("/details", get(details))
}

#[derive(Debug, Serialize, Default)]
struct DetailsPage {
    page_title: &'static str,
    loaded: bool,
    name: String,
    uploaded_at: String,
    rows: usize,
    columns: usize,
    duplicates: usize,
    info: String,
    describe: String,
    missing: String,
}

/// Landing page. Wipes the chart and upload directories but keeps the session.
async fn landing(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    {
        let _pipeline = state.pipeline.lock().await;
        let charts = state.charts.clone();
        tokio::task::spawn_blocking(move || charts.reset()).await??;
    }

    if let Some(dataset) = state.session.current() {
        tracing::warn!(
            "Charts cleared while session still holds {}; details will outlive its charts",
            dataset.display_name
        );
    }

    state.views.render("index", &json!({ "page_title": "Home" }))
}

async fn process(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    state.views.render("process", &json!({ "page_title": "Processing" }))
}

async fn details(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let Some(dataset) = state.session.current() else {
        tracing::debug!("Details requested with an empty session");
        return state.views.render(
            "details",
            &DetailsPage {
                page_title: "Details",
                ..DetailsPage::default()
            },
        );
    };

    let page = tokio::task::spawn_blocking(move || -> Result<DetailsPage, AppError> {
        let profile = profiler::profile(&dataset.table, DescribeMode::All)?;
        Ok(DetailsPage {
            page_title: "Details",
            loaded: true,
            name: dataset.display_name.clone(),
            uploaded_at: dataset.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            rows: profile.row_count,
            columns: profile.column_count,
            duplicates: profile.duplicates,
            info: info_table(&profile.column_info),
            describe: describe_table(&profile.describe),
            missing: missing_table(&profile.missing),
        })
    })
    .await??;

    state.views.render("details", &page)
}
