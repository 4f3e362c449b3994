use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use care_payment_engine::{
    db_types::{NewMessage, OrderDoc, OrderId, OrderStatus},
    events::{EventHandlers, EventHooks},
    transitions::OrderTransition,
    LedgerDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use cpg_common::Money;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

use crate::support::prepare_env::{prepare_test_env, random_db_path};

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

async fn tear_down(api: OrderFlowApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db().clone().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

#[test]
fn transitions_reach_the_subscribers() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let created = HookCalled::default();
    let status_changes = HookCalled::default();
    let created_copy = created.clone();
    let status_copy = status_changes.clone();
    rt.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");

        let mut hooks = EventHooks::default();
        hooks.on_order_transition(move |event| {
            info!("🪝️ {} on {}", event.transition, event.order.order_id);
            match event.transition {
                OrderTransition::Created => created_copy.called(),
                OrderTransition::StatusChanged { .. } => status_copy.called(),
                _ => {},
            }
            Box::pin(async {})
        });
        let handlers = EventHandlers::new(10, hooks);
        let api = OrderFlowApi::new(db, handlers.producers());
        handlers.start_handlers().await;

        let doc = OrderDoc::new(OrderId::from("order-1"), "patient-1", Money::from_pounds(80));
        let _ = api.process_order_created(doc.clone()).await.expect("Error processing order");
        let _ = api.process_order_update(doc.with_status(OrderStatus::Accepted)).await.expect("Error processing order");

        // Give the handler task a beat to drain the channel.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tear_down(api).await;
    });
    assert_eq!(created.count(), 1);
    assert_eq!(status_changes.count(), 1);
    info!("🪝️ test complete");
}

#[test]
fn messages_fan_out_without_touching_the_store() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let seen = HookCalled::default();
    let seen_copy = seen.clone();
    rt.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");

        let mut hooks = EventHooks::default();
        hooks.on_message_created(move |event| {
            info!("🪝️ message for {}", event.message.recipient_id);
            seen_copy.called();
            Box::pin(async {})
        });
        let handlers = EventHandlers::new(10, hooks);
        let api = OrderFlowApi::new(db, handlers.producers());
        handlers.start_handlers().await;

        let message = NewMessage {
            sender_name: "Dr Salma".to_string(),
            text: "On my way".to_string(),
            recipient_id: "patient-1".to_string(),
        };
        api.process_new_message(message).await;

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tear_down(api).await;
    });
    assert_eq!(seen.count(), 1);
}
