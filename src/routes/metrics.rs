use axum::http::{header, StatusCode};
use prometheus::{Encoder, TextEncoder};

/// GET /metrics — Prometheus text exposition of the default registry.
pub async fn metrics_handler() -> Result<([(header::HeaderName, String); 1], String), StatusCode> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let body = String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body))
}
