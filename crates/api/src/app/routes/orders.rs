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
    Router::new().route("/", post(place_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let order = body.into_order();
    match services.settlement.place_order(&order).await {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::OrderResponse::from(receipt))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
