//! Route definitions and router construction.
//!
//! The usual `build_cors_layer`/`create_router` split, narrowed to this
//! adapter's handful of endpoints.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::bootstrap::CorsConfig;
use crate::handlers;
use crate::state::AppState;

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new().allow_origin(allowed).allow_methods(Any).allow_headers(Any)
        }
    }
}

pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .route("/twiml", get(handlers::twiml::twiml).post(handlers::twiml::twiml))
        .route("/ws/media-stream", get(handlers::telephony_ws::media_stream_ws))
        .route("/ws/browser", get(handlers::browser_ws::browser_ws))
        .route("/admin/dial", post(handlers::admin::enqueue_dial))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
