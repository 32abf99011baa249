use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use grocer_core::ProductId;
use grocer_infra::ledger_store::{LedgerFilter, LedgerStore, Pagination};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/adjust", post(adjust_stock))
        .route("/log", get(ledger_log))
        .route("/audit/:product_id", get(audit_stock))
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.query.stock_view(product_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    match services
        .adjuster
        .adjust(body.product_id, body.delta, &body.note)
        .await
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn ledger_log(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::LedgerLogQuery>,
) -> axum::response::Response {
    let filter = LedgerFilter {
        product_id: params.product_id.map(ProductId::new),
        from: params.from,
        to: params.to,
    };
    let pagination = Pagination::new(params.limit, params.offset);

    match services.query.log(&filter, pagination).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// Recompute the ledger sum for one product and compare it to its stock row.
pub async fn audit_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.audit(product_id).await {
        Ok(audit) => Json(serde_json::json!({
            "product_id": audit.product_id,
            "on_hand": audit.on_hand,
            "ledger_sum": audit.ledger_sum,
            "consistent": audit.is_consistent(),
        }))
        .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
