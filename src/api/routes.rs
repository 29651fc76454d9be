use axum::{
    routing::post,
    Router,
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::api::models::{AnalyzeRequest, RegisterDomainsRequest, RegisterDomainsResponse};
use crate::api::response;
use crate::security::is_valid_domain;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/register-domains", post(register_domains_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected analyze payload: {}", rejection.body_text());
            return response::error(StatusCode::BAD_REQUEST, "Request body must be JSON with url and keyphrase")
                .into_response();
        }
    };

    let url = req.url.unwrap_or_default();
    let keyphrase = req.keyphrase.unwrap_or_default();
    info!("Processing analysis request for URL: {}", url);
    let start_time = Instant::now();

    // Set an overall timeout for the entire analysis
    let result = tokio::time::timeout(
        Duration::from_secs(state.config.analyze_timeout_secs),
        state.analyzer.analyze(&url, &keyphrase),
    )
    .await;

    let elapsed = start_time.elapsed();
    info!("Request processing took: {:?}", elapsed);

    match result {
        Ok(Ok(report)) => response::success(report).into_response(),
        Ok(Err(err)) => {
            match &err {
                AppError::ValidationError(msg) => info!("Validation error: {}", msg),
                AppError::SecurityRejection(msg) => warn!(target: "security", "Security rejection: {}", msg),
                AppError::NetworkError(msg) => error!("Network error: {}", msg),
                AppError::AnalysisError(msg) => error!("Analysis error: {}", msg),
                AppError::ConfigError(msg) => error!("Config error: {}", msg),
            }
            err.into_response()
        }
        Err(_) => {
            error!("Analysis timed out after {:?}", elapsed);
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "Analysis timed out").into_response()
        }
    }
}

async fn register_domains_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDomainsRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected register-domains payload: {}", rejection.body_text());
            return response::error(StatusCode::BAD_REQUEST, "Request body must be JSON with a domains array")
                .into_response();
        }
    };

    let mut registered = Vec::new();
    let mut failed = Vec::new();
    for domain in req.domains {
        if is_valid_domain(&domain) {
            state.allowlist.add_domain(&domain);
            registered.push(domain.trim().to_lowercase());
        } else {
            warn!("Refusing to allowlist invalid domain {:?}", domain);
            failed.push(domain);
        }
    }
    info!(
        "Registered {} domains ({} failed), allowlist now has {} entries",
        registered.len(),
        failed.len(),
        state.allowlist.len()
    );

    response::success(RegisterDomainsResponse {
        success: failed.is_empty(),
        registered,
        failed,
    })
    .into_response()
}
