use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

/// Public catalogue routes. Browsing doctors and checking slot availability
/// requires no account.
pub fn doctor_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/schedules", get(handlers::get_doctor_schedules))
        .route(
            "/{doctor_id}/available-slots",
            get(handlers::get_available_slots),
        )
        .with_state(config)
}
