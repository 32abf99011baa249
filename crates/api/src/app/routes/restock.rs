use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use grocer_core::RestockId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_restock_orders).post(create_restock_order))
        .route("/:id", get(get_restock_order))
}

pub async fn create_restock_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRestockRequest>,
) -> axum::response::Response {
    match services
        .restock
        .create_restock_order(body.supplier_id, body.lines())
        .await
    {
        Ok(recorded) => (
            StatusCode::CREATED,
            Json(dto::RestockCreated {
                restock_id: recorded.intent.restock_id,
                expected_total_cost: recorded.expected_total_cost,
            }),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_restock_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.restock.list().await {
        Ok(intents) => Json(intents).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_restock_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let restock_id: RestockId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.restock.get(restock_id).await {
        Ok(intent) => Json(intent).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
