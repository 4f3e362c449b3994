use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, MessageCreatedEvent, OrderTransitionEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_transition_producer: Vec<EventProducer<OrderTransitionEvent>>,
    pub message_created_producer: Vec<EventProducer<MessageCreatedEvent>>,
}

pub struct EventHandlers {
    pub on_order_transition: Option<EventHandler<OrderTransitionEvent>>,
    pub on_message_created: Option<EventHandler<MessageCreatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_transition = hooks.on_order_transition.map(|f| EventHandler::new(buffer_size, f));
        let on_message_created = hooks.on_message_created.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_transition, on_message_created }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_transition {
            result.order_transition_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_message_created {
            result.message_created_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_transition {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_message_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_transition: Option<Handler<OrderTransitionEvent>>,
    pub on_message_created: Option<Handler<MessageCreatedEvent>>,
}

impl EventHooks {
    pub fn on_order_transition<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderTransitionEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_transition = Some(Arc::new(f));
        self
    }

    pub fn on_message_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MessageCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_message_created = Some(Arc::new(f));
        self
    }
}
