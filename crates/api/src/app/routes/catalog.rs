use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/categories", post(create_category))
        .route("/suppliers", post(create_supplier))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.catalog.add_category(body.name) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.catalog.add_supplier(body.name) {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
