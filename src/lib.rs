pub mod config;
pub mod datasource;
pub mod error;
pub mod handlers;
pub mod kairos_client;
pub mod models;
pub mod result_mapper;
pub mod translate;

use axum::{Router, routing::get, routing::post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use datasource::Datasource;

#[derive(Clone)]
pub struct AppState {
    pub datasource: Datasource,
    pub kairosdb_endpoint: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/query", post(handlers::query::execute_query))
        .route("/healthz", get(handlers::health::healthz))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
