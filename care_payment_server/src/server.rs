use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use care_payment_engine::{
    dispatch::NotificationDispatcher,
    events::{EventHandlers, EventHooks, EventProducers},
    AccountApi,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
    MIGRATOR,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::fcm::FcmGateway,
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
    sweep_worker::{start_archive_worker, start_cancellation_worker},
};

const EVENT_BUFFER_SIZE: usize = 50;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    MIGRATOR.run(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let handlers = build_event_handlers(&config, db.clone())?;
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_cancellation_worker(db.clone(), config.sweeps.clone());
    start_archive_worker(db.clone(), config.sweeps.clone());

    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Wires the notification dispatcher into the engine's event hooks. Hooks run on their own tasks after the
/// triggering transaction has committed, so push delivery can never hold up or roll back a ledger write.
fn build_event_handlers(config: &ServerConfig, db: SqliteDatabase) -> Result<EventHandlers, ServerError> {
    let gateway = FcmGateway::new(config.fcm.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let dispatcher = Arc::new(NotificationDispatcher::new(db, gateway));
    let mut hooks = EventHooks::default();
    let d = Arc::clone(&dispatcher);
    hooks.on_order_transition(move |event| {
        let d = Arc::clone(&d);
        Box::pin(async move {
            d.dispatch_transition(&event).await;
        })
    });
    hooks.on_message_created(move |event| {
        let d = Arc::clone(&dispatcher);
        Box::pin(async move {
            d.dispatch_message(&event).await;
        })
    });
    Ok(EventHandlers::new(EVENT_BUFFER_SIZE, hooks))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        let order_flow_api = OrderFlowApi::new(db.clone(), producers.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(auth_config.clone()))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(accounts_api));
        let api_scope = web::scope("/api")
            .route("/ledger/settle", web::post().to(settle::<SqliteDatabase>))
            .route("/ledger/payout", web::post().to(payout::<SqliteDatabase>))
            .route("/ledger/history/{worker_id}", web::get().to(history::<SqliteDatabase>))
            .route("/order/{order_id}", web::get().to(order_by_id::<SqliteDatabase>));
        let trigger_scope = web::scope("/incoming")
            .route("/order_created", web::post().to(incoming_order_created::<SqliteDatabase>))
            .route("/order_updated", web::post().to(incoming_order_updated::<SqliteDatabase>))
            .route("/message", web::post().to(incoming_message::<SqliteDatabase>))
            .route("/worker_registered", web::post().to(incoming_worker_registered::<SqliteDatabase>))
            .route("/push_token", web::post().to(incoming_push_token::<SqliteDatabase>))
            .route("/coupon_created", web::post().to(incoming_coupon_created::<SqliteDatabase>));
        app.service(health).service(api_scope).service(trigger_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?;
    info!("🚀️ Server bound to {}:{}", config.host, config.port);
    Ok(srv.run())
}
