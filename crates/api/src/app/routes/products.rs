use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use grocer_catalog::{NewProduct, ProductFilter};
use grocer_core::Money;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ProductFilter>,
) -> axum::response::Response {
    match services.catalog.list(&filter) {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    match services.catalog.search(&query.name) {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Register a product with the catalog and make it known to inventory,
/// optionally recording its opening stock.
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Some(qty) = body.initial_stock {
        if qty < 0 {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                "initial_stock must not be negative",
            );
        }
    }

    let unit_price = match Money::new(body.unit_price) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let new = NewProduct {
        name: body.name,
        category_id: body.category_id,
        brand: body.brand,
        unit_price,
        unit: body.unit,
        description: body.description,
        image_ref: body.image_ref,
    };
    let (product, quantity) = match services.register_product(new, body.initial_stock).await {
        Ok(registered) => registered,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "product": product,
            "quantity": quantity,
        })),
    )
        .into_response()
}
