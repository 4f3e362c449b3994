use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{NewMessage, Order, OrderDoc, OrderId, OrderStatus, PaymentMethod},
    events::{EventProducers, MessageCreatedEvent, OrderTransitionEvent},
    traits::{ArchiveSweepResult, CompletionReceipt, LedgerDatabase, LedgerError},
    transitions::{detect, OrderTransition},
};

/// `OrderFlowApi` is the primary API for reacting to store triggers: order snapshots, chat messages and the
/// scheduled maintenance ticks.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

/// True when the after-snapshot still owes ledger entries from an earlier delivery that failed to post.
/// Orders without a nurse are excluded: they have nobody to owe a commission to, and the edge path has
/// already surfaced `NoWorkerOnOrder` for them once.
fn owes_commission(after: &Order) -> bool {
    after.status == OrderStatus::Completed &&
        after.payment_method == PaymentMethod::Cash &&
        after.nurse_id.is_some() &&
        !after.commission_posted
}

/// Everything one order-updated trigger produced: the stored after-snapshot, the detected transitions, and
/// the ledger receipt when a cash completion was posted.
#[derive(Debug, Clone)]
pub struct OrderUpdateOutcome {
    pub order: Order,
    pub transitions: Vec<OrderTransition>,
    pub receipt: Option<CompletionReceipt>,
}

impl<B> OrderFlowApi<B>
where B: LedgerDatabase
{
    /// Handles the order-created trigger.
    ///
    /// The snapshot is upserted into the mirror. A genuinely new order publishes a `Created` transition (which
    /// the dispatcher turns into the new-order broadcast); redelivery of a creation the mirror already knows
    /// about publishes nothing.
    pub async fn process_order_created(&self, doc: OrderDoc) -> Result<(Order, bool), LedgerError> {
        let (order, created) = self.db.upsert_order(doc).await?;
        if created {
            debug!("🔄️📦️ Order {} entered the mirror", order.order_id);
            self.publish_transitions(&order, &[OrderTransition::Created]).await;
        } else {
            debug!("🔄️📦️ Duplicate creation delivery for {}; no event published", order.order_id);
        }
        Ok((order, created))
    }

    /// Handles the order-updated trigger.
    ///
    /// The mirror row is the before-snapshot; the delivered document is the after-snapshot. The detector diffs
    /// the two, a `CashOrderCompleted` transition posts the ledger entries (the per-order marker makes
    /// redelivery a no-op), and every transition is published to the hooks after the posting has committed.
    ///
    /// Ledger errors propagate to the caller so the upstream at-least-once delivery can redeliver the event.
    /// The mirror has already advanced by then, so a redelivery after a failed posting carries no
    /// `CashOrderCompleted` edge anymore. The posting therefore keys off the marker, not the edge: any
    /// completed cash order whose marker is still clear gets re-posted.
    pub async fn process_order_update(&self, doc: OrderDoc) -> Result<OrderUpdateOutcome, LedgerError> {
        let before = self.db.fetch_order_by_order_id(&doc.order_id).await?;
        let (after, _created) = self.db.upsert_order(doc).await?;
        let transitions = detect(before.as_ref(), &after);
        trace!("🔄️📦️ {} transition(s) detected for {}", transitions.len(), after.order_id);

        let mut receipt = None;
        if transitions.contains(&OrderTransition::CashOrderCompleted) || owes_commission(&after) {
            receipt = self.db.post_cash_completion(&after).await?;
            match &receipt {
                Some(r) => info!(
                    "🔄️💰️ Cash completion for {} posted: {} commission debited from {}",
                    after.order_id, r.commission, r.worker_id
                ),
                None => debug!("🔄️💰️ Cash completion for {} was already posted; skipped", after.order_id),
            }
        }

        self.publish_transitions(&after, &transitions).await;
        Ok(OrderUpdateOutcome { order: after, transitions, receipt })
    }

    /// Handles the message-created trigger. Pure fan-out; no store writes.
    pub async fn process_new_message(&self, message: NewMessage) {
        for producer in &self.producers.message_created_producer {
            producer.publish_event(MessageCreatedEvent::new(message.clone())).await;
        }
    }

    /// Runs the cancellation-window sweep against the current clock.
    pub async fn open_cancellation_windows(&self) -> Result<Vec<OrderId>, LedgerError> {
        self.db.open_cancellation_windows(Utc::now()).await
    }

    /// Runs one page of the archival sweep: terminal orders untouched for `retention`, at most `page_size`
    /// per run.
    pub async fn archive_stale_orders(
        &self,
        retention: Duration,
        page_size: u32,
    ) -> Result<ArchiveSweepResult, LedgerError> {
        let cutoff = Utc::now() - retention;
        self.db.archive_stale_orders(cutoff, page_size).await
    }

    async fn publish_transitions(&self, order: &Order, transitions: &[OrderTransition]) {
        for producer in &self.producers.order_transition_producer {
            for transition in transitions {
                trace!("🔄️📦️ Publishing {transition} for {}", order.order_id);
                let event = OrderTransitionEvent::new(order.clone(), transition.clone());
                producer.publish_event(event).await;
            }
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
