//! Health check route.
//!
//! Answers `GET <path>` with `200 OK` and the configured text, whether or
//! not any components are registered.

use axum::routing::get;
use axum::Router;

use crate::manifest::HealthRoute;

/// Create an axum `Router` serving the health route.
pub fn health_router(route: &HealthRoute) -> Router {
    let body = route.response.clone();
    Router::new().route(
        &route.path,
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    )
}
