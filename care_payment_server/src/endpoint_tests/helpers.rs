use actix_web::{
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use care_payment_engine::{events::EventProducers, AccountApi, LedgerApi, OrderFlowApi, SqliteDatabase, MIGRATOR};
use cpg_common::Secret;
use serde::Serialize;

use crate::{
    auth::API_KEY_HEADER,
    config::AuthConfig,
    routes::{
        health,
        history,
        incoming_coupon_created,
        incoming_message,
        incoming_order_created,
        incoming_order_updated,
        incoming_push_token,
        incoming_worker_registered,
        order_by_id,
        payout,
        settle,
    },
};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const SERVICE_KEY: &str = "test-service-key";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        admin_api_key: Secret::new(ADMIN_KEY.to_string()),
        service_api_key: Secret::new(SERVICE_KEY.to_string()),
    }
}

pub async fn memory_db() -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database");
    MIGRATOR.run(db.pool()).await.expect("Error running migrations");
    db
}

/// Registers the full route table against an in-memory backend, without the event plumbing.
pub fn configure(db: SqliteDatabase) -> impl Fn(&mut ServiceConfig) {
    move |cfg| {
        let order_flow_api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let ledger_api = LedgerApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        cfg.app_data(web::Data::new(test_auth_config()))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(accounts_api))
            .service(health)
            .service(
                web::scope("/api")
                    .route("/ledger/settle", web::post().to(settle::<SqliteDatabase>))
                    .route("/ledger/payout", web::post().to(payout::<SqliteDatabase>))
                    .route("/ledger/history/{worker_id}", web::get().to(history::<SqliteDatabase>))
                    .route("/order/{order_id}", web::get().to(order_by_id::<SqliteDatabase>)),
            )
            .service(
                web::scope("/incoming")
                    .route("/order_created", web::post().to(incoming_order_created::<SqliteDatabase>))
                    .route("/order_updated", web::post().to(incoming_order_updated::<SqliteDatabase>))
                    .route("/message", web::post().to(incoming_message::<SqliteDatabase>))
                    .route("/worker_registered", web::post().to(incoming_worker_registered::<SqliteDatabase>))
                    .route("/push_token", web::post().to(incoming_push_token::<SqliteDatabase>))
                    .route("/coupon_created", web::post().to(incoming_coupon_created::<SqliteDatabase>)),
            );
    }
}

pub fn post_json<B: Serialize>(path: &str, api_key: &str, body: &B) -> TestRequest {
    TestRequest::post().uri(path).insert_header((API_KEY_HEADER, api_key)).set_json(body)
}

pub fn get(path: &str, api_key: &str) -> TestRequest {
    TestRequest::get().uri(path).insert_header((API_KEY_HEADER, api_key))
}
