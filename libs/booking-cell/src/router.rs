use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Booking routes. Everything here requires a valid bearer token; the staff
/// check on status updates happens in the handler.
pub fn booking_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::booking_history).post(handlers::create_booking),
        )
        .route("/{booking_code}", get(handlers::get_booking))
        .route("/{booking_code}/cancel", post(handlers::cancel_booking))
        .route("/{booking_code}/status", patch(handlers::update_status))
        .route("/{booking_code}/review", post(handlers::submit_review))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ))
        .with_state(config)
}
