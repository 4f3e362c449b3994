//! FCM-backed implementation of the engine's push-delivery seam.
use std::sync::Arc;

use care_payment_engine::traits::{PushError, PushNotification, PushPriority, PushTransport};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::{json, Value};

use crate::config::FcmConfig;

#[derive(Clone)]
pub struct FcmGateway {
    config: FcmConfig,
    client: Arc<Client>,
}

impl FcmGateway {
    pub fn new(config: FcmConfig) -> Result<Self, PushError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("key={}", config.server_key.reveal()))
            .map_err(|e| PushError::Transport(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| PushError::Transport(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn post(&self, payload: Value) -> Result<(), PushError> {
        trace!("📨️ Posting push payload to {}", self.config.endpoint);
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        if response.status().is_success() {
            trace!("📨️ Push accepted. {}", response.status());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            Err(PushError::Rejected(format!("HTTP {status}: {message}")))
        }
    }

    fn payload(to: &str, notification: &PushNotification) -> Value {
        let priority = match notification.priority {
            PushPriority::Normal => "normal",
            PushPriority::High => "high",
        };
        json!({
            "to": to,
            "priority": priority,
            "notification": {
                "title": notification.title,
                "body": notification.body,
            },
            "data": notification.data,
        })
    }
}

impl PushTransport for FcmGateway {
    async fn send_to_token(&self, token: &str, notification: &PushNotification) -> Result<(), PushError> {
        self.post(Self::payload(token, notification)).await
    }

    async fn send_to_topic(&self, topic: &str, notification: &PushNotification) -> Result<(), PushError> {
        self.post(Self::payload(&format!("/topics/{topic}"), notification)).await
    }
}
