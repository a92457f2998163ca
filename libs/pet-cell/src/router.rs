use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Owner-scoped pet routes. Everything here requires a valid bearer token.
pub fn pet_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_pets).post(handlers::create_pet))
        .route(
            "/{pet_id}",
            get(handlers::get_pet)
                .patch(handlers::update_pet)
                .delete(handlers::deactivate_pet),
        )
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ))
        .with_state(config)
}
