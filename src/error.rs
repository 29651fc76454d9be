use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

use crate::security::GateRejection;

#[derive(Serialize)]
pub struct ErrorResponse {
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    SecurityRejection(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::SecurityRejection(_) => StatusCode::BAD_REQUEST,
            AppError::NetworkError(_) | AppError::AnalysisError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl From<GateRejection> for AppError {
    fn from(rejection: GateRejection) -> Self {
        match rejection {
            GateRejection::InvalidUrl(_) => AppError::ValidationError(rejection.to_string()),
            GateRejection::DnsFailure { .. } => AppError::NetworkError(rejection.to_string()),
            _ => AppError::SecurityRejection(rejection.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
