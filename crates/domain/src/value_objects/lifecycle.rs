use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::value_objects::enums::subscription_statuses::SubscriptionStatus;

/// Lifecycle events that may move a subscription between states. Both the
/// webhook processor and the admin API go through [`next_status`] so there is
/// a single place deciding which transitions exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionEvent {
    PurchaseApproved,
    PaymentOverdue,
    Canceled,
    Refunded,
    Chargeback,
    Expired,
}

impl SubscriptionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionEvent::PurchaseApproved => "purchase_approved",
            SubscriptionEvent::PaymentOverdue => "payment_overdue",
            SubscriptionEvent::Canceled => "canceled",
            SubscriptionEvent::Refunded => "refunded",
            SubscriptionEvent::Chargeback => "chargeback",
            SubscriptionEvent::Expired => "expired",
        }
    }
}

impl Display for SubscriptionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States from which [`SubscriptionEvent::Expired`] is a valid transition.
/// The periodic expiry sweep selects rows by this set so it stays in lockstep
/// with [`next_status`].
pub const LIVE_STATUSES: [SubscriptionStatus; 2] =
    [SubscriptionStatus::Active, SubscriptionStatus::PastDue];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Option<SubscriptionStatus>,
    pub event: SubscriptionEvent,
}

impl Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.from {
            Some(from) => write!(f, "event {} is not valid from state {}", self.event, from),
            None => write!(f, "event {} is not valid without a subscription", self.event),
        }
    }
}

impl std::error::Error for InvalidTransition {}

/// Computes the state a subscription moves to when `event` arrives while it
/// is in `current` (`None` means the user has no subscription row yet).
///
/// A purchase is accepted from any state: it covers first purchases,
/// renewals, recovery of an overdue payment, and re-subscribing after a
/// cancellation or expiry. Everything else requires a live (`active` or
/// `past_due`) subscription, except that overdue notices only make sense on
/// an `active` one.
pub fn next_status(
    current: Option<SubscriptionStatus>,
    event: SubscriptionEvent,
) -> Result<SubscriptionStatus, InvalidTransition> {
    use SubscriptionStatus::{Active, PastDue};

    let invalid = InvalidTransition {
        from: current,
        event,
    };

    match event {
        SubscriptionEvent::PurchaseApproved => Ok(Active),
        SubscriptionEvent::PaymentOverdue => match current {
            Some(Active) => Ok(PastDue),
            _ => Err(invalid),
        },
        SubscriptionEvent::Canceled
        | SubscriptionEvent::Refunded
        | SubscriptionEvent::Chargeback => match current {
            Some(Active) | Some(PastDue) => Ok(SubscriptionStatus::Canceled),
            _ => Err(invalid),
        },
        SubscriptionEvent::Expired => match current {
            Some(Active) | Some(PastDue) => Ok(SubscriptionStatus::Expired),
            _ => Err(invalid),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_is_accepted_from_every_state() {
        for current in [
            None,
            Some(SubscriptionStatus::Active),
            Some(SubscriptionStatus::PastDue),
            Some(SubscriptionStatus::Canceled),
            Some(SubscriptionStatus::Expired),
        ] {
            assert_eq!(
                next_status(current, SubscriptionEvent::PurchaseApproved),
                Ok(SubscriptionStatus::Active)
            );
        }
    }

    #[test]
    fn overdue_requires_an_active_subscription() {
        assert_eq!(
            next_status(
                Some(SubscriptionStatus::Active),
                SubscriptionEvent::PaymentOverdue
            ),
            Ok(SubscriptionStatus::PastDue)
        );
        assert!(next_status(None, SubscriptionEvent::PaymentOverdue).is_err());
        assert!(
            next_status(
                Some(SubscriptionStatus::Canceled),
                SubscriptionEvent::PaymentOverdue
            )
            .is_err()
        );
    }

    #[test]
    fn revocation_events_cancel_live_subscriptions() {
        for event in [
            SubscriptionEvent::Canceled,
            SubscriptionEvent::Refunded,
            SubscriptionEvent::Chargeback,
        ] {
            assert_eq!(
                next_status(Some(SubscriptionStatus::Active), event),
                Ok(SubscriptionStatus::Canceled)
            );
            assert_eq!(
                next_status(Some(SubscriptionStatus::PastDue), event),
                Ok(SubscriptionStatus::Canceled)
            );
            assert!(next_status(Some(SubscriptionStatus::Expired), event).is_err());
        }
    }

    #[test]
    fn live_statuses_are_exactly_the_states_expiry_accepts() {
        for status in LIVE_STATUSES {
            assert_eq!(
                next_status(Some(status), SubscriptionEvent::Expired),
                Ok(SubscriptionStatus::Expired)
            );
        }
        for status in [SubscriptionStatus::Canceled, SubscriptionStatus::Expired] {
            assert!(!LIVE_STATUSES.contains(&status));
            assert!(next_status(Some(status), SubscriptionEvent::Expired).is_err());
        }
    }

    #[test]
    fn expiry_only_applies_to_live_subscriptions() {
        assert_eq!(
            next_status(Some(SubscriptionStatus::PastDue), SubscriptionEvent::Expired),
            Ok(SubscriptionStatus::Expired)
        );
        assert!(next_status(None, SubscriptionEvent::Expired).is_err());
        assert!(
            next_status(Some(SubscriptionStatus::Canceled), SubscriptionEvent::Expired).is_err()
        );
    }
}
