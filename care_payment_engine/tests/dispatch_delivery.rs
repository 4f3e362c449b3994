use std::sync::{Arc, Mutex};

use care_payment_engine::{
    db_types::{NewMessage, OrderDoc, OrderFlag, OrderId, OrderStatus},
    dispatch::{NotificationDispatcher, NURSES_TOPIC},
    events::{MessageCreatedEvent, OrderTransitionEvent},
    traits::{PushError, PushNotification, PushTransport},
    transitions::OrderTransition,
    AccountManagement,
    LedgerDatabase,
    SqliteDatabase,
};
use cpg_common::Money;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

use crate::support::prepare_env::{prepare_test_env, random_db_path};

mod support;

/// Captures every send as `(destination, notification)` so tests can assert on what went out.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<(String, PushNotification)>>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<(String, PushNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

impl PushTransport for RecordingTransport {
    async fn send_to_token(&self, token: &str, notification: &PushNotification) -> Result<(), PushError> {
        self.sent.lock().unwrap().push((format!("token:{token}"), notification.clone()));
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, notification: &PushNotification) -> Result<(), PushError> {
        self.sent.lock().unwrap().push((format!("topic:{topic}"), notification.clone()));
        Ok(())
    }
}

/// Refuses every send, the way FCM does when the service is down.
struct FailingTransport;

impl PushTransport for FailingTransport {
    async fn send_to_token(&self, _token: &str, _n: &PushNotification) -> Result<(), PushError> {
        Err(PushError::Transport("connection refused".into()))
    }

    async fn send_to_topic(&self, _topic: &str, _n: &PushNotification) -> Result<(), PushError> {
        Err(PushError::Rejected("503 Service Unavailable".into()))
    }
}

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        log::error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

fn order_doc() -> OrderDoc {
    OrderDoc::new(OrderId::from("order-3001"), "patient-7", Money::from_pounds(150)).with_nurse("nurse-1")
}

#[test]
fn notifications_are_routed_to_the_stored_tokens() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        db.register_worker_account("nurse-1", Some("worker-token".into())).await.unwrap();
        db.set_push_token("patient-7", "patient-token").await.unwrap();
        let (order, _) = db.upsert_order(order_doc()).await.unwrap();

        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(db.clone(), transport.clone());

        // A creation goes out as a broadcast; no token lookup involved.
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order.clone(), OrderTransition::Created)).await;
        // An acceptance notifies the patient on their stored token.
        let accepted =
            OrderTransition::StatusChanged { old: OrderStatus::Pending, new: OrderStatus::Accepted };
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order.clone(), accepted)).await;
        // A latched confirmation flag notifies the assigned worker on the account token.
        let confirmed = OrderTransition::FlagLatched(OrderFlag::PatientConfirmedNurseMoving);
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order, confirmed)).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].0, format!("topic:{NURSES_TOPIC}"));
        assert_eq!(sent[1].0, "token:patient-token");
        assert_eq!(sent[1].1.data.get("type").map(String::as_str), Some("order_status_accepted"));
        assert_eq!(sent[2].0, "token:worker-token");

        tear_down(db).await;
    });
}

#[test]
fn missing_tokens_skip_delivery_silently() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        // Worker registered without a device token; the patient never stored one at all.
        db.register_worker_account("nurse-1", None).await.unwrap();
        let (order, _) = db.upsert_order(order_doc()).await.unwrap();

        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(db.clone(), transport.clone());

        let accepted =
            OrderTransition::StatusChanged { old: OrderStatus::Pending, new: OrderStatus::Accepted };
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order.clone(), accepted)).await;
        let confirmed = OrderTransition::FlagLatched(OrderFlag::PatientConfirmedNurseMoving);
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order, confirmed)).await;
        let message = NewMessage {
            sender_name: "Nurse Amal".into(),
            text: "On my way".into(),
            recipient_id: "patient-7".into(),
        };
        dispatcher.dispatch_message(&MessageCreatedEvent::new(message)).await;

        assert!(transport.sent().is_empty());

        tear_down(db).await;
    });
}

#[test]
fn transport_failures_never_propagate() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        db.register_worker_account("nurse-1", Some("worker-token".into())).await.unwrap();
        db.set_push_token("patient-7", "patient-token").await.unwrap();
        let (order, _) = db.upsert_order(order_doc()).await.unwrap();

        let dispatcher = NotificationDispatcher::new(db.clone(), FailingTransport);

        // Topic, token and message deliveries all fail at the transport; none of them surfaces an error.
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order.clone(), OrderTransition::Created)).await;
        let accepted =
            OrderTransition::StatusChanged { old: OrderStatus::Pending, new: OrderStatus::Accepted };
        dispatcher.dispatch_transition(&OrderTransitionEvent::new(order, accepted)).await;
        let message = NewMessage {
            sender_name: "Nurse Amal".into(),
            text: "On my way".into(),
            recipient_id: "patient-7".into(),
        };
        dispatcher.dispatch_message(&MessageCreatedEvent::new(message)).await;

        tear_down(db).await;
    });
}
