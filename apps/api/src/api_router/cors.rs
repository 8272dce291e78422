use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use pondok_core::AppError;
use tower_http::cors::CorsLayer;

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = frontend_url.trim_end_matches('/');

    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(origin)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]))
}
