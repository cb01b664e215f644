use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Open CORS for the JSON API and the admin panel's browser client.
pub fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(CSRF_HEADER),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_origin(Any)
}
