use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use partida_core::LedgerError;
use partida_ledger::EntryStatus;

/// Map a ledger error onto the HTTP surface.
///
/// The unbalanced case carries both totals and the signed difference in the
/// body so a client can render exactly how far off the entry is.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        LedgerError::Unbalanced {
            debit_total,
            credit_total,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "unbalanced",
                "message": format!(
                    "entry does not balance: debit {debit_total} != credit {credit_total}"
                ),
                "debit_total": debit_total,
                "credit_total": credit_total,
                "difference": debit_total - credit_total,
            })),
        )
            .into_response(),
        LedgerError::InvalidState(msg) => json_error(StatusCode::CONFLICT, "invalid_state", msg),
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        LedgerError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
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

pub fn parse_status(s: &str) -> Result<EntryStatus, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(EntryStatus::Draft),
        "confirmed" => Ok(EntryStatus::Confirmed),
        "voided" => Ok(EntryStatus::Voided),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status must be one of: draft, confirmed, voided",
        )),
    }
}
