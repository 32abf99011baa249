use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full router around an already-wired service graph.
pub fn build_app(services: AppServices) -> Router {
    routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(crate::middleware::trace_request))
            .layer(Extension(Arc::new(services))),
    )
}
