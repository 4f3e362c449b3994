use crate::{
    db_types::{Order, OrderFlag, OrderStatus},
    traits::PushNotification,
    transitions::OrderTransition,
};

/// Topic every on-duty worker device subscribes to for new-order broadcasts.
pub const NURSES_TOPIC: &str = "nurses";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Patient(String),
    Worker(String),
    Topic(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targeted {
    pub recipient: Recipient,
    pub notification: PushNotification,
}

fn push(kind: &str, order: &Order, title: &str, body: String) -> PushNotification {
    PushNotification::new(title, body)
        .with_data("type", kind)
        .with_data("order_id", order.order_id.as_str())
        .with_data("click_action", "FLUTTER_NOTIFICATION_CLICK")
}

fn to_patient(order: &Order, notification: PushNotification) -> Targeted {
    Targeted { recipient: Recipient::Patient(order.user_id.clone()), notification }
}

fn to_worker(order: &Order, notification: PushNotification) -> Option<Targeted> {
    order.nurse_id.as_ref().map(|nurse_id| Targeted {
        recipient: Recipient::Worker(nurse_id.clone()),
        notification,
    })
}

/// The transition → notification table. Most transitions map to zero or one notification; a cancellation
/// notifies both parties.
pub fn notifications_for(transition: &OrderTransition, order: &Order) -> Vec<Targeted> {
    match transition {
        OrderTransition::Created => {
            let body = format!("You have a new service request worth {}.", order.total_price);
            let notification = push("new_order", order, "New service request!", body);
            vec![Targeted { recipient: Recipient::Topic(NURSES_TOPIC), notification }]
        },
        OrderTransition::FlagLatched(flag) => notification_for_flag(*flag, order).into_iter().collect(),
        OrderTransition::StatusChanged { new, .. } => notifications_for_status(*new, order),
        // Ledger-only; the patient and worker already hear about the underlying status change.
        OrderTransition::CashOrderCompleted => vec![],
    }
}

fn notification_for_flag(flag: OrderFlag, order: &Order) -> Option<Targeted> {
    match flag {
        OrderFlag::NurseMovingConfirmed => {
            let n = push(
                "nurse_moving_confirmed",
                order,
                "Your nurse is on the way",
                format!("The nurse has confirmed they are heading to you for order {}.", order.order_id),
            );
            Some(to_patient(order, n))
        },
        OrderFlag::NurseMovingRequested => {
            let n = push(
                "movement_confirmation_requested",
                order,
                "Please confirm you are on the way",
                format!("The patient asked you to confirm movement for order {}.", order.order_id),
            )
            .high_priority();
            to_worker(order, n)
        },
        OrderFlag::PatientConfirmedNurseMoving => {
            let n = push(
                "patient_confirmed_movement",
                order,
                "Movement confirmed",
                format!("The patient confirmed your movement for order {}.", order.order_id),
            );
            to_worker(order, n)
        },
        OrderFlag::PaymentConfirmedByNurse => {
            let n = push(
                "cash_payment_registered_by_nurse",
                order,
                "Cash payment registered",
                format!("The nurse registered receiving {} in cash for order {}.", order.final_price, order.order_id),
            );
            Some(to_patient(order, n))
        },
        OrderFlag::PaymentConfirmedByPatient => {
            let n = push(
                "cash_payment_confirmed_by_patient",
                order,
                "Payment confirmed by patient",
                format!("The patient confirmed the cash payment for order {}.", order.order_id),
            );
            to_worker(order, n)
        },
        // Flipped by the maintenance sweep; the client polls this flag, no push is sent.
        OrderFlag::CanCancelAfterAccept => None,
    }
}

fn notifications_for_status(new: OrderStatus, order: &Order) -> Vec<Targeted> {
    let (kind, title, body) = match new {
        // A move back to Pending is not part of the normal lifecycle; stay silent rather than confuse the user.
        OrderStatus::Pending => return vec![],
        OrderStatus::Accepted => {
            ("order_status_accepted", "Order accepted", format!("A nurse accepted your order {}.", order.order_id))
        },
        OrderStatus::Arrived => {
            ("order_status_arrived", "Your nurse has arrived", format!("The nurse arrived for order {}.", order.order_id))
        },
        OrderStatus::Completed => {
            ("order_status_completed", "Order completed", format!("Your order {} is complete.", order.order_id))
        },
        OrderStatus::Rejected => {
            ("order_status_rejected", "Order rejected", format!("Unfortunately order {} was rejected.", order.order_id))
        },
        OrderStatus::Cancelled => {
            ("order_status_cancelled", "Order cancelled", format!("Order {} has been cancelled.", order.order_id))
        },
    };
    let mut targets = vec![to_patient(order, push(kind, order, title, body.clone()))];
    if new == OrderStatus::Cancelled {
        if let Some(t) = to_worker(order, push(kind, order, title, body)) {
            targets.push(t);
        }
    }
    targets
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use cpg_common::Money;

    use super::*;
    use crate::{
        db_types::{OrderId, PaymentMethod},
        traits::PushPriority,
    };

    fn order() -> Order {
        Order {
            id: 7,
            order_id: OrderId::from("order-7"),
            user_id: "patient-7".into(),
            nurse_id: Some("nurse-7".into()),
            status: OrderStatus::Accepted,
            payment_method: PaymentMethod::Cash,
            total_price: Money::from_pounds(150),
            discount_amount: Money::default(),
            final_price: Money::from_pounds(150),
            commission_rate: 0.1,
            coupon_code: None,
            nurse_moving_confirmed: false,
            nurse_moving_requested: false,
            patient_confirmed_nurse_moving: false,
            payment_confirmed_by_nurse: false,
            payment_confirmed_by_patient: false,
            can_cancel_after_accept: false,
            cancellation_available_at: None,
            commission_posted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn created_broadcasts_to_the_nurses_topic() {
        let targets = notifications_for(&OrderTransition::Created, &order());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].recipient, Recipient::Topic(NURSES_TOPIC));
        assert_eq!(targets[0].notification.data.get("type").map(String::as_str), Some("new_order"));
    }

    #[test]
    fn movement_request_is_high_priority_to_the_worker() {
        let targets =
            notifications_for(&OrderTransition::FlagLatched(OrderFlag::NurseMovingRequested), &order());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].recipient, Recipient::Worker("nurse-7".into()));
        assert_eq!(targets[0].notification.priority, PushPriority::High);
    }

    #[test]
    fn flag_recipients_match_the_table() {
        let o = order();
        let cases = [
            (OrderFlag::NurseMovingConfirmed, Recipient::Patient("patient-7".into())),
            (OrderFlag::PatientConfirmedNurseMoving, Recipient::Worker("nurse-7".into())),
            (OrderFlag::PaymentConfirmedByNurse, Recipient::Patient("patient-7".into())),
            (OrderFlag::PaymentConfirmedByPatient, Recipient::Worker("nurse-7".into())),
        ];
        for (flag, recipient) in cases {
            let targets = notifications_for(&OrderTransition::FlagLatched(flag), &o);
            assert_eq!(targets.len(), 1, "{flag} should map to one notification");
            assert_eq!(targets[0].recipient, recipient, "{flag} recipient mismatch");
        }
    }

    #[test]
    fn cancel_window_flag_maps_to_nothing() {
        let targets =
            notifications_for(&OrderTransition::FlagLatched(OrderFlag::CanCancelAfterAccept), &order());
        assert!(targets.is_empty());
    }

    #[test]
    fn cancellation_notifies_both_parties() {
        let transition = OrderTransition::StatusChanged { old: OrderStatus::Accepted, new: OrderStatus::Cancelled };
        let targets = notifications_for(&transition, &order());
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].recipient, Recipient::Patient("patient-7".into()));
        assert_eq!(targets[1].recipient, Recipient::Worker("nurse-7".into()));
    }

    #[test]
    fn other_status_changes_notify_the_patient_only() {
        for status in [OrderStatus::Accepted, OrderStatus::Arrived, OrderStatus::Completed, OrderStatus::Rejected] {
            let transition = OrderTransition::StatusChanged { old: OrderStatus::Pending, new: status };
            let targets = notifications_for(&transition, &order());
            assert_eq!(targets.len(), 1, "{status} should notify exactly one recipient");
            assert_eq!(targets[0].recipient, Recipient::Patient("patient-7".into()));
        }
    }

    #[test]
    fn cash_completion_is_ledger_only() {
        assert!(notifications_for(&OrderTransition::CashOrderCompleted, &order()).is_empty());
    }
}
