use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery errors at the push boundary. Always caught at the dispatcher, logged and discarded; never
/// propagated and never retried by the engine.
#[derive(Debug, Clone, Error)]
pub enum PushError {
    #[error("Push transport error: {0}")]
    Transport(String),
    #[error("The push service rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushPriority {
    #[default]
    Normal,
    High,
}

/// One outbound notification: human-readable copy plus a structured data payload for the client app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    pub priority: PushPriority,
}

impl PushNotification {
    pub fn new<T: Into<String>, B: Into<String>>(title: T, body: B) -> Self {
        Self { title: title.into(), body: body.into(), data: HashMap::new(), priority: PushPriority::Normal }
    }

    pub fn with_data<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn high_priority(mut self) -> Self {
        self.priority = PushPriority::High;
        self
    }
}

/// The push-delivery seam. Both calls are fire-and-forget from the engine's perspective: a failure is reported
/// through the `Result` so the dispatcher can log it, but nothing upstream retries.
#[allow(async_fn_in_trait)]
pub trait PushTransport {
    async fn send_to_token(&self, token: &str, notification: &PushNotification) -> Result<(), PushError>;

    async fn send_to_topic(&self, topic: &str, notification: &PushNotification) -> Result<(), PushError>;
}
