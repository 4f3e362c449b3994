use actix_web::{http::StatusCode, test, App};
use care_payment_engine::{
    db_types::{OrderDoc, OrderId, OrderStatus},
    AccountManagement,
};
use cpg_common::Money;
use serde_json::json;

use super::helpers::{configure, memory_db, post_json, ADMIN_KEY, SERVICE_KEY};

fn cash_order() -> OrderDoc {
    OrderDoc::new(OrderId::from("order-1001"), "patient-7", Money::from_pounds(200))
        .with_nurse("nurse-1")
        .with_commission_rate(0.15)
}

#[actix_web::test]
async fn health_needs_no_key() {
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn cash_completion_flows_through_the_trigger_surface() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db.clone()))).await;

    let registration = json!({ "worker_id": "nurse-1", "fcm_token": "token-abc" });
    let req = post_json("/incoming/worker_registered", SERVICE_KEY, &registration).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = post_json("/incoming/order_created", SERVICE_KEY, &cash_order()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let completed = cash_order().with_status(OrderStatus::Completed);
    let req = post_json("/incoming/order_updated", SERVICE_KEY, &completed).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let account = db.fetch_worker_account("nurse-1").await.unwrap().unwrap();
    assert_eq!(account.payout_balance, Money::from_pounds(-30));
    assert_eq!(account.fcm_token.as_deref(), Some("token-abc"));
}

#[actix_web::test]
async fn completion_against_a_missing_account_is_a_5xx_for_redelivery() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db.clone()))).await;

    let req = post_json("/incoming/order_created", SERVICE_KEY, &cash_order()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // No worker account exists, so the posting fails and upstream must redeliver.
    let completed = cash_order().with_status(OrderStatus::Completed);
    let req = post_json("/incoming/order_updated", SERVICE_KEY, &completed).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Once the late registration lands, redelivering the identical update posts the commission.
    let registration = json!({ "worker_id": "nurse-1", "fcm_token": null });
    let req = post_json("/incoming/worker_registered", SERVICE_KEY, &registration).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = post_json("/incoming/order_updated", SERVICE_KEY, &completed).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let account = db.fetch_worker_account("nurse-1").await.unwrap().unwrap();
    assert_eq!(account.payout_balance, Money::from_pounds(-30));
}

#[actix_web::test]
async fn triggers_reject_the_admin_key() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = post_json("/incoming/order_created", ADMIN_KEY, &cash_order()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn push_tokens_and_coupons_are_stored() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db.clone()))).await;

    let token = json!({ "user_id": "patient-7", "token": "patient-token" });
    let req = post_json("/incoming/push_token", SERVICE_KEY, &token).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(db.fetch_push_token("patient-7").await.unwrap().as_deref(), Some("patient-token"));

    let coupon = json!({ "code": "SAVE20" });
    let req = post_json("/incoming/coupon_created", SERVICE_KEY, &coupon).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(db.fetch_coupon("SAVE20").await.unwrap().unwrap().used_count, 0);
}

#[actix_web::test]
async fn admins_can_look_up_mirrored_orders() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = post_json("/incoming/order_created", SERVICE_KEY, &cash_order()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = super::helpers::get("/api/order/order-1001", ADMIN_KEY).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: care_payment_engine::db_types::Order = test::read_body_json(resp).await;
    assert_eq!(order.order_id, OrderId::from("order-1001"));

    let req = super::helpers::get("/api/order/no-such-order", ADMIN_KEY).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn messages_are_accepted() {
    let _ = env_logger::try_init();
    let db = memory_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let message = json!({ "sender_name": "Dr Salma", "text": "On my way", "recipient_id": "patient-7" });
    let req = post_json("/incoming/message", SERVICE_KEY, &message).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
