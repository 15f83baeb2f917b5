use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use partida_core::AccountId;
use partida_infra::{InMemoryAccountDirectory, InMemoryLedgerStore, LedgerService};
use partida_ledger::account::Account;

struct TestServer {
    base_url: String,
    cash: Uuid,
    sales: Uuid,
    assets_group: Uuid,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Builds the production router over an in-memory store and a small
    /// seeded chart, bound to an ephemeral port.
    async fn spawn() -> Self {
        let cash = AccountId::new();
        let sales = AccountId::new();
        let assets_group = AccountId::new();

        let directory = InMemoryAccountDirectory::with_accounts([
            Account {
                id: cash,
                code: "1.1.01".to_string(),
                name: "Caja".to_string(),
                imputable: true,
            },
            Account {
                id: sales,
                code: "4.1.01".to_string(),
                name: "Ventas".to_string(),
                imputable: true,
            },
            Account {
                id: assets_group,
                code: "1".to_string(),
                name: "Activo".to_string(),
                imputable: false,
            },
        ]);

        let service = LedgerService::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(directory),
        );
        let app = partida_api::app::build_app(service);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            cash: *cash.as_uuid(),
            sales: *sales.as_uuid(),
            assets_group: *assets_group.as_uuid(),
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn entry_body(srv: &TestServer, date: &str, description: &str, amount: i64) -> serde_json::Value {
    json!({
        "date": date,
        "description": description,
        "type": "daily",
        "lines": [
            { "account_id": srv.cash, "debit": amount },
            { "account_id": srv.sales, "credit": amount },
        ],
    })
}

async fn create_entry(
    client: &reqwest::Client,
    srv: &TestServer,
    body: &serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/entries", srv.base_url))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/healthz", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_confirm_and_trial_balance_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-10", "Venta de mostrador", 150_000),
    )
    .await;
    assert_eq!(created["status"], "draft");
    assert_eq!(created["number"], 1);
    assert_eq!(created["lines"].as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let res = client
        .post(format!("{}/entries/{}/confirm", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let confirmed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(confirmed["status"], "confirmed");

    let res = client
        .get(format!(
            "{}/reports/trial-balance?date_from=2026-03-01&date_to=2026-03-31",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();

    assert_eq!(report["debit_total"], 150_000);
    assert_eq!(report["credit_total"], 150_000);
    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Rows come back sorted by account code.
    assert_eq!(rows[0]["account_code"], "1.1.01");
    assert_eq!(rows[0]["debtor_balance"], 150_000);
    assert_eq!(rows[1]["account_code"], "4.1.01");
    assert_eq!(rows[1]["creditor_balance"], 150_000);
}

#[tokio::test]
async fn unbalanced_confirm_returns_422_with_totals() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body = json!({
        "date": "2026-03-10",
        "description": "Asiento descuadrado",
        "type": "daily",
        "lines": [
            { "account_id": srv.cash, "debit": 1_000 },
            { "account_id": srv.sales, "credit": 700 },
        ],
    });
    let created = create_entry(&client, &srv, &body).await;
    let id = created["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/entries/{}/confirm", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unbalanced");
    assert_eq!(err["debit_total"], 1_000);
    assert_eq!(err["credit_total"], 700);
    assert_eq!(err["difference"], 300);

    // Refused confirmation leaves the entry editable.
    let res = client
        .get(format!("{}/entries/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let entry: serde_json::Value = res.json().await.unwrap();
    assert_eq!(entry["status"], "draft");
}

#[tokio::test]
async fn confirmed_entries_reject_edits_with_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-10", "Venta", 500),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/entries/{}/confirm", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(format!("{}/entries/{}", srv.base_url, id))
        .json(&json!({ "description": "editado" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(format!("{}/entries/{}/movements", srv.base_url, id))
        .json(&json!({ "account_id": srv.cash, "debit": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .delete(format!("{}/entries/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn voided_entries_drop_out_of_reports_but_stay_readable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-10", "Venta anulada luego", 900),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    client
        .post(format!("{}/entries/{}/confirm", srv.base_url, id))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/entries/{}/void", srv.base_url, id))
        .json(&json!({ "reason": "cobro duplicado" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let voided: serde_json::Value = res.json().await.unwrap();
    assert_eq!(voided["status"], "voided");
    assert_eq!(voided["void_reason"], "cobro duplicado");

    let res = client
        .get(format!(
            "{}/reports/trial-balance?date_from=2026-03-01&date_to=2026-03-31",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    let report: serde_json::Value = res.json().await.unwrap();
    assert!(report["rows"].as_array().unwrap().is_empty());

    // Still fully readable, movements included.
    let res = client
        .get(format!("{}/entries/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let entry: serde_json::Value = res.json().await.unwrap();
    assert_eq!(entry["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn void_requires_a_confirmed_entry_and_a_reason() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-10", "Borrador", 100),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/entries/{}/void", srv.base_url, id))
        .json(&json!({ "reason": "error" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    client
        .post(format!("{}/entries/{}/confirm", srv.base_url, id))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/entries/{}/void", srv.base_url, id))
        .json(&json!({ "reason": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_by_status_and_orders_by_date_then_number() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let first = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-15", "Posterior", 100),
    )
    .await;
    let second = create_entry(
        &client,
        &srv,
        &entry_body(&srv, "2026-03-01", "Anterior", 200),
    )
    .await;

    client
        .post(format!(
            "{}/entries/{}/confirm",
            srv.base_url,
            second["id"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/entries", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listing: serde_json::Value = res.json().await.unwrap();
    let items = listing["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["description"], "Anterior");
    assert_eq!(items[1]["description"], "Posterior");
    assert_eq!(items[0]["debit_total"], 200);

    let res = client
        .get(format!("{}/entries?status=confirmed", srv.base_url))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = res.json().await.unwrap();
    let items = listing["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], second["id"]);
    assert_ne!(items[0]["id"], first["id"]);
}

#[tokio::test]
async fn postings_to_group_accounts_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body = json!({
        "date": "2026-03-10",
        "description": "Imputación a rubro",
        "type": "daily",
        "lines": [
            { "account_id": srv.assets_group, "debit": 100 },
            { "account_id": srv.sales, "credit": 100 },
        ],
    });

    let res = client
        .post(format!("{}/entries", srv.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn unknown_entry_returns_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/entries/{}", srv.base_url, Uuid::now_v7()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trial_balance_rejects_inverted_range() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/reports/trial-balance?date_from=2026-03-31&date_to=2026-03-01",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
