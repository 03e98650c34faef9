pub mod assets;
pub mod config;
pub mod db;
pub mod fetcher;
pub mod geocoder;
pub mod handlers;
pub mod network;
pub mod openapi;
pub mod orchestrator;
pub mod presenter;
pub mod store;
pub mod view;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: handlers::AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/cities/search", get(handlers::search_cities))
        .route("/api/cities/select", post(handlers::select_city))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/view", get(handlers::get_view))
        .route("/api/recent", get(handlers::get_recent))
        .route("/api/theme", get(handlers::get_theme))
        .route("/api/theme/toggle", post(handlers::toggle_theme))
        .route("/api/connectivity", put(handlers::set_connectivity))
        .route("/", get(handlers::serve_index))
        .route("/assets/{*path}", get(handlers::serve_asset))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
