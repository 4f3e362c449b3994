use actix_web::{http::StatusCode, test, App};
use care_payment_engine::AccountManagement;
use cpg_common::Money;
use serde_json::json;

use super::helpers::{configure, get, memory_db, post_json, ADMIN_KEY, SERVICE_KEY};
use crate::data_objects::{BalanceResponse, HistoryResponse};

#[actix_web::test]
async fn settle_returns_the_new_balance() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    db.register_worker_account("nurse-1", None).await.unwrap();
    let app = test::init_service(App::new().configure(configure(db))).await;

    let body = json!({ "nurse_id": "nurse-1", "amount": 5000, "note": "weekly settle" });
    let req = post_json("/api/ledger/settle", ADMIN_KEY, &body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let balance: BalanceResponse = test::read_body_json(resp).await;
    assert!(balance.success);
    assert_eq!(balance.new_balance, Money::from_pounds(50));
}

#[actix_web::test]
async fn over_payout_is_a_structured_400() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    db.register_worker_account("nurse-1", None).await.unwrap();
    let app = test::init_service(App::new().configure(configure(db))).await;

    let body = json!({ "nurse_id": "nurse-1", "amount": 5000, "note": "cash out" });
    let req = post_json("/api/ledger/payout", ADMIN_KEY, &body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = test::read_body_json(resp).await;
    assert!(err["error"].as_str().unwrap().contains("only 0.00 EGP is available"));
}

#[actix_web::test]
async fn history_lists_the_journal() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    db.register_worker_account("nurse-1", None).await.unwrap();
    let app = test::init_service(App::new().configure(configure(db))).await;

    let body = json!({ "nurse_id": "nurse-1", "amount": 2500, "note": "seed" });
    let req = post_json("/api/ledger/settle", ADMIN_KEY, &body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = get("/api/ledger/history/nurse-1", ADMIN_KEY).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let history: HistoryResponse = test::read_body_json(resp).await;
    assert_eq!(history.account.payout_balance, Money::from_pounds(25));
    assert_eq!(history.entries.len(), 1);
}

#[actix_web::test]
async fn ledger_routes_reject_the_service_key() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    db.register_worker_account("nurse-1", None).await.unwrap();
    let app = test::init_service(App::new().configure(configure(db.clone()))).await;

    let body = json!({ "nurse_id": "nurse-1", "amount": 5000, "note": "nope" });
    let req = post_json("/api/ledger/settle", SERVICE_KEY, &body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let account = db.fetch_worker_account("nurse-1").await.unwrap().unwrap();
    assert!(account.payout_balance.is_zero());
}

#[actix_web::test]
async fn unknown_api_keys_are_unauthorized() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let body = json!({ "nurse_id": "nurse-1", "amount": 5000, "note": "nope" });
    let req = post_json("/api/ledger/settle", "not-a-key", &body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post().uri("/api/ledger/settle").set_json(&body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
