use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_router;
use doctor_cell::router::doctor_router;
use pet_cell::router::pet_router;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "PetCare Clinic API is running!" }))
        .nest("/doctors", doctor_router(state.clone()))
        .nest("/pets", pet_router(state.clone()))
        .nest("/bookings", booking_router(state.clone()))
}
