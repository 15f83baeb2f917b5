//! Router wiring.

use std::sync::Arc;

use axum::{Extension, Router};

use partida_infra::LedgerService;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the application router over a ready ledger service.
///
/// The same router serves production (`main.rs` picks the store from the
/// environment) and black-box tests (in-memory store on an ephemeral port).
pub fn build_app(service: LedgerService) -> Router {
    Router::new()
        .nest("/entries", routes::entries::router())
        .nest("/reports", routes::reports::router())
        .merge(routes::system::router())
        .layer(Extension(Arc::new(service)))
}
