//! Daily car card
//!
//! Servicio que genera una carta coleccionable de coche por día: elige un
//! coche del catálogo, genera su ilustración, la compone con los textos
//! (y el brillo holo en coches caros), la guarda y la sirve por HTTP.

pub mod catalog;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

/// Router completo montado bajo el base path configurado
pub fn create_app(state: AppState) -> Router {
    let api = routes::create_card_router()
        .nest_service("/data/images", ServeDir::new(state.card_service.images_dir()));

    let router = match state.config.base_path.as_str() {
        "" => api,
        base => Router::new().nest(base, api),
    };

    router
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
