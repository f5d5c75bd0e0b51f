use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body returned for any upload that cannot be decoded with the guessed encoding.
pub const DECODE_FAILURE_MESSAGE: &str = "Error loading the CSV";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("DataFrame error: {0}")]
    DataFrame(String),
    #[error("Chart error: {0}")]
    Chart(String),
    #[error("Template error: {0}")]
    Template(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<polars::prelude::PolarsError> for AppError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AppError::DataFrame(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        AppError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for AppError {
    fn from(err: handlebars::TemplateError) -> Self {
        AppError::Template(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("worker task failed: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // The decoder's detail stays in the log.
            AppError::Decode(_) => (StatusCode::BAD_REQUEST, DECODE_FAILURE_MESSAGE.to_string()),
            AppError::Parse(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::DataFrame(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Chart(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Template(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_hide_their_detail() {
        let response = AppError::Decode("invalid byte 0xff at offset 12".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_errors_are_server_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
