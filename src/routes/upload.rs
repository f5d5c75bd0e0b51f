use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppError,
    services::{
        pipeline::{self, Ingested},
        profiler,
    },
    views::{describe_table, head_table, missing_table},
    AppState,
};

const FILE_FIELD: &str = "file";
const INVALID_FILE_MESSAGE: &str = "Invalid file. Please upload a CSV file.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/process_file", get(process_file).post(process_file))
}

#[derive(Debug, Serialize)]
struct ColumnType {
    name: String,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct SummaryPage {
    page_title: &'static str,
    name: String,
    rows: usize,
    columns: usize,
    duplicates: usize,
    types: Vec<ColumnType>,
    describe: String,
    /// Empty when no column has a missing value.
    missing: String,
    head: String,
    charts: usize,
}

/// Pulls the `file` part out of the form: `(file name, contents)`.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<(String, Bytes)>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        return Ok(Some((file_name, data)));
    }
    Ok(None)
}

async fn process_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|e| {
        AppError::InvalidInput(format!("Expected a multipart form with a file part: {}", e))
    })?;
    let (file_name, data) = read_file_field(multipart)
        .await?
        .ok_or_else(|| AppError::InvalidInput("No file part in the request".to_string()))?;

    if file_name.is_empty() {
        tracing::debug!("Upload without a file name, back to the form");
        return Ok(Redirect::to("/process").into_response());
    }
    if !pipeline::has_accepted_extension(&file_name, &state.config.accepted_extension) {
        tracing::warn!("Rejected upload {}: not a CSV file", file_name);
        return Ok((StatusCode::OK, INVALID_FILE_MESSAGE).into_response());
    }

    tracing::info!("Processing upload {} ({}KB)", file_name, data.len() / 1024);
    let _pipeline = state.pipeline.lock().await;

    let worker_state = state.clone();
    let ingested = tokio::task::spawn_blocking(move || {
        pipeline::ingest(
            &worker_state.config,
            &worker_state.charts,
            &file_name,
            &data,
        )
    })
    .await??;

    let page = summary_page(&ingested);
    state.session.replace(ingested.dataset);
    Ok(state.views.render("process_file", &page)?.into_response())
}

fn summary_page(ingested: &Ingested) -> SummaryPage {
    let Ingested {
        dataset,
        profile,
        head,
    } = ingested;
    let missing = profile.missing_nonzero();

    SummaryPage {
        page_title: "Overview",
        name: dataset.display_name.clone(),
        rows: profile.row_count,
        columns: profile.column_count,
        duplicates: profile.duplicates,
        types: profiler::column_types(&dataset.table)
            .into_iter()
            .map(|(name, kind)| ColumnType {
                name,
                kind: kind.label(),
            })
            .collect(),
        describe: describe_table(&profile.describe),
        missing: if missing.is_empty() {
            String::new()
        } else {
            missing_table(missing)
        },
        head: head_table(&dataset.table.column_names(), head),
        charts: dataset.manifest.len(),
    }
}
