use std::sync::Arc;

use partida_infra::{
    InMemoryAccountDirectory, InMemoryLedgerStore, LedgerService, LedgerStore, PostgresLedgerStore,
};
use partida_ledger::account::Account;

#[tokio::main]
async fn main() {
    partida_observability::init();

    let store: Arc<dyn LedgerStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to postgres");
            let store = PostgresLedgerStore::new(pool);
            store.ensure_schema().await.expect("failed to apply schema");
            tracing::info!("using postgres-backed ledger store");
            Arc::new(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory ledger store");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    let directory = Arc::new(load_chart_of_accounts());
    let service = LedgerService::new(store, directory);

    let app = partida_api::app::build_app(service);

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

/// Loads the chart of accounts from the JSON file named by
/// `CHART_OF_ACCOUNTS`, or starts empty when unset.
fn load_chart_of_accounts() -> InMemoryAccountDirectory {
    let Ok(path) = std::env::var("CHART_OF_ACCOUNTS") else {
        tracing::warn!("CHART_OF_ACCOUNTS not set; starting with an empty chart");
        return InMemoryAccountDirectory::new();
    };

    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read chart of accounts {path}: {e}"));
    let accounts: Vec<Account> = serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("invalid chart of accounts {path}: {e}"));

    tracing::info!(count = accounts.len(), "loaded chart of accounts");
    InMemoryAccountDirectory::with_accounts(accounts)
}
