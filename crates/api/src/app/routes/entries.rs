use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use partida_core::{EntryId, MovementId};
use partida_infra::{EntryFilter, LedgerService, NewEntry};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_entry).get(list_entries))
        .route(
            "/:id",
            get(get_entry).patch(update_draft).delete(delete_entry),
        )
        .route("/:id/movements", post(add_movement))
        .route(
            "/:id/movements/:movement_id",
            axum::routing::delete(remove_movement),
        )
        .route("/:id/confirm", post(confirm_entry))
        .route("/:id/void", post(void_entry))
}

pub async fn create_entry(
    Extension(service): Extension<Arc<LedgerService>>,
    Json(body): Json<dto::CreateEntryRequest>,
) -> axum::response::Response {
    let new = NewEntry {
        date: body.date,
        description: body.description,
        entry_type: body.entry_type,
    };
    let lines = body
        .lines
        .into_iter()
        .map(dto::MovementRequest::into_new_movement)
        .collect();

    match service.create_entry(new, lines).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_entry(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match service.get_entry(EntryId::from_uuid(id)).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_entries(
    Extension(service): Extension<Arc<LedgerService>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        Some(s) => match errors::parse_status(s) {
            Ok(status) => Some(status),
            Err(resp) => return resp,
        },
        None => None,
    };
    let filter = EntryFilter {
        status,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    match service.list_entries(filter).await {
        Ok(summaries) => {
            let items = summaries.iter().map(dto::summary_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items })),
            )
                .into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_draft(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::UpdateDraftRequest>,
) -> axum::response::Response {
    match service
        .update_draft(EntryId::from_uuid(id), body.date, body.description)
        .await
    {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_entry(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match service.delete_entry(EntryId::from_uuid(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn add_movement(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::MovementRequest>,
) -> axum::response::Response {
    match service
        .add_movement(EntryId::from_uuid(id), body.into_new_movement())
        .await
    {
        Ok(movement) => {
            (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn remove_movement(
    Extension(service): Extension<Arc<LedgerService>>,
    Path((id, movement_id)): Path<(Uuid, Uuid)>,
) -> axum::response::Response {
    match service
        .remove_movement(EntryId::from_uuid(id), MovementId::from_uuid(movement_id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn confirm_entry(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match service.confirm(EntryId::from_uuid(id)).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn void_entry(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::VoidRequest>,
) -> axum::response::Response {
    match service.void(EntryId::from_uuid(id), body.reason).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
