//! Maps detected transitions to outbound push notifications and delivers them best-effort.
//!
//! The mapping itself ([`notifications_for`]) is a pure function over the closed transition and status enums,
//! so the full table is checked exhaustively at compile time and unit-testable without a store or a transport.
//! Delivery happens through the [`PushTransport`] seam and is strictly fire-and-forget: a missing token skips
//! silently, a transport failure is logged and swallowed. Nothing here can roll back or re-run a ledger
//! transaction, because the dispatcher only ever runs from event hooks after commit.

mod mapping;

pub use mapping::{notifications_for, Recipient, Targeted, NURSES_TOPIC};

use log::*;

use crate::{
    db_types::NewMessage,
    events::{MessageCreatedEvent, OrderTransitionEvent},
    traits::{AccountManagement, PushNotification, PushTransport},
};

pub struct NotificationDispatcher<B, T> {
    db: B,
    transport: T,
}

impl<B, T> NotificationDispatcher<B, T>
where
    B: AccountManagement,
    T: PushTransport,
{
    pub fn new(db: B, transport: T) -> Self {
        Self { db, transport }
    }

    /// Delivers every notification the mapping table produces for this transition. Never fails; every problem
    /// is logged and dropped.
    pub async fn dispatch_transition(&self, event: &OrderTransitionEvent) {
        let targets = notifications_for(&event.transition, &event.order);
        trace!("📨️ {} notification(s) mapped for {} on {}", targets.len(), event.transition, event.order.order_id);
        for target in targets {
            self.deliver(target).await;
        }
    }

    /// New chat message → one notification to the recipient's device.
    pub async fn dispatch_message(&self, event: &MessageCreatedEvent) {
        let NewMessage { sender_name, text, recipient_id } = &event.message;
        let notification = PushNotification::new(format!("New message from {sender_name}!"), text.clone())
            .with_data("type", "new_message")
            .with_data("click_action", "FLUTTER_NOTIFICATION_CLICK");
        let target = Targeted { recipient: Recipient::Patient(recipient_id.clone()), notification };
        self.deliver(target).await;
    }

    async fn deliver(&self, target: Targeted) {
        let Targeted { recipient, notification } = target;
        let result = match &recipient {
            Recipient::Topic(topic) => self.transport.send_to_topic(topic, &notification).await,
            Recipient::Worker(worker_id) => {
                let token = match self.worker_token(worker_id).await {
                    Some(t) => t,
                    None => {
                        debug!("📨️ No push token for worker {worker_id}; skipping notification");
                        return;
                    },
                };
                self.transport.send_to_token(&token, &notification).await
            },
            Recipient::Patient(user_id) => {
                let token = match self.patient_token(user_id).await {
                    Some(t) => t,
                    None => {
                        debug!("📨️ No push token for patient {user_id}; skipping notification");
                        return;
                    },
                };
                self.transport.send_to_token(&token, &notification).await
            },
        };
        match result {
            Ok(()) => trace!("📨️ Notification delivered to {recipient:?}"),
            Err(e) => warn!("📨️ Best-effort delivery to {recipient:?} failed: {e}"),
        }
    }

    async fn worker_token(&self, worker_id: &str) -> Option<String> {
        match self.db.fetch_worker_account(worker_id).await {
            Ok(Some(account)) => account.fcm_token,
            Ok(None) => None,
            Err(e) => {
                warn!("📨️ Could not look up worker {worker_id} for notification delivery: {e}");
                None
            },
        }
    }

    async fn patient_token(&self, user_id: &str) -> Option<String> {
        match self.db.fetch_push_token(user_id).await {
            Ok(token) => token,
            Err(e) => {
                warn!("📨️ Could not look up push token for {user_id}: {e}");
                None
            },
        }
    }
}
