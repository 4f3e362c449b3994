//! Edge-triggered transition detection.
//!
//! Given two consecutive snapshots of the same order, [`detect`] classifies which semantically meaningful
//! transitions occurred. It is a pure function of the two snapshots: no I/O, no clock, no side effects, which is
//! what makes the rest of the pipeline (ledger postings, notification fan-out) independently testable.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderFlag, OrderStatus, PaymentMethod};

/// A semantically meaningful change between two consecutive snapshots of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTransition {
    /// First write of the order. No flag or status transitions are derived from a creation.
    Created,
    /// A one-way latch boolean went false→true.
    FlagLatched(OrderFlag),
    /// The status field changed.
    StatusChanged { old: OrderStatus, new: OrderStatus },
    /// The order entered `Completed` as a cash order with a worker assigned. This derived event is the sole
    /// trigger for ledger postings and is emitted in addition to the generic `StatusChanged`.
    CashOrderCompleted,
}

impl Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderTransition::Created => write!(f, "created"),
            OrderTransition::FlagLatched(flag) => write!(f, "flag-latched({flag})"),
            OrderTransition::StatusChanged { old, new } => write!(f, "status-changed({old}→{new})"),
            OrderTransition::CashOrderCompleted => write!(f, "cash-order-completed"),
        }
    }
}

/// Diffs two snapshots of the same order and returns the transitions that occurred, in a stable order:
/// flag latches first (in [`OrderFlag::ALL`] order), then the status change, then the derived cash-completion
/// event.
///
/// When `before` is `None` (first write), only [`OrderTransition::Created`] fires.
pub fn detect(before: Option<&Order>, after: &Order) -> Vec<OrderTransition> {
    let before = match before {
        Some(b) => b,
        None => return vec![OrderTransition::Created],
    };
    let mut transitions = Vec::new();
    for flag in OrderFlag::ALL {
        if !before.flag(flag) && after.flag(flag) {
            transitions.push(OrderTransition::FlagLatched(flag));
        }
    }
    if before.status != after.status {
        transitions.push(OrderTransition::StatusChanged { old: before.status, new: after.status });
    }
    let completed_now = before.status != OrderStatus::Completed && after.status == OrderStatus::Completed;
    if completed_now && after.payment_method == PaymentMethod::Cash && after.nurse_id.is_some() {
        transitions.push(OrderTransition::CashOrderCompleted);
    }
    transitions
}
