use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use partida_infra::LedgerService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/trial-balance", get(trial_balance))
}

pub async fn trial_balance(
    Extension(service): Extension<Arc<LedgerService>>,
    Query(query): Query<dto::TrialBalanceQuery>,
) -> axum::response::Response {
    match service.trial_balance(query.date_from, query.date_to).await {
        Ok(rows) => {
            let items = rows
                .iter()
                .map(dto::trial_balance_row_to_json)
                .collect::<Vec<_>>();
            let debit_total: i64 = rows.iter().map(|r| r.debit_total).sum();
            let credit_total: i64 = rows.iter().map(|r| r.credit_total).sum();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "date_from": query.date_from,
                    "date_to": query.date_to,
                    "rows": items,
                    "debit_total": debit_total,
                    "credit_total": credit_total,
                })),
            )
                .into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}
