use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewMessage, Order},
    transitions::OrderTransition,
};

/// Published once per transition the detector reports, strictly after any ledger work for the triggering
/// update has committed. Subscribers must not assume exactly-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTransitionEvent {
    pub order: Order,
    pub transition: OrderTransition,
}

impl OrderTransitionEvent {
    pub fn new(order: Order, transition: OrderTransition) -> Self {
        Self { order, transition }
    }
}

/// Published when the message-created trigger fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreatedEvent {
    pub message: NewMessage,
}

impl MessageCreatedEvent {
    pub fn new(message: NewMessage) -> Self {
        Self { message }
    }
}
