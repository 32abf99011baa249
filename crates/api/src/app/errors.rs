use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use grocer_core::DomainError;
use grocer_infra::LedgerError;

/// Map a core failure onto its HTTP status and JSON body.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Domain(e) => domain_error_to_response(e),
        LedgerError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = err.code();
    match err {
        DomainError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, code, msg),
        DomainError::InsufficientStock {
            product_id,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": code,
                "message": err.to_string(),
                "product_id": product_id,
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        DomainError::IntegrityViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, code, msg)
        }
        DomainError::TransientContention(msg) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({
                "error": code,
                "message": msg,
                "retryable": true,
            })),
        )
            .into_response(),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
