pub mod client;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::storage::StorageBackend;
use axum::{
    Router,
    routing::{any, get},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub config: ServerConfig,
}

pub fn create_app(state: AppState) -> Router {
    // The upload route takes every method: the handler itself answers
    // non-POST requests with the fixed invalid-request message.
    let download_route = format!(
        "{}/:filename",
        state.config.download_base_path.trim_end_matches('/')
    );
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &state.config.upload_path,
            any(handlers::upload::handle_upload),
        )
        .route(&download_route, get(handlers::download::download_file))
        .with_state(state)
}
