pub mod doppus;
pub mod hotmart;

use domain::value_objects::lifecycle::SubscriptionEvent;
use sha2::{Digest, Sha256};

/// Provider-independent view of a webhook payload. Parsing is lenient: a
/// payload that cannot be fully normalized is still ingested raw and fails
/// later, at processing time, with a terminal error.
#[derive(Debug, Clone, Default)]
pub struct NormalizedWebhook {
    pub event_type: String,
    /// `None` for informational events (cart abandonment, billet printed and
    /// the like) that never touch a subscription.
    pub action: Option<SubscriptionEvent>,
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,
    pub transaction_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub product_id: Option<String>,
    pub offer_id: Option<String>,
}

/// Idempotency key for deliveries that carry no transaction id. Hashing the
/// raw body keeps byte-identical redeliveries collapsed while distinct
/// payloads stay distinct.
pub fn fallback_idempotency_key(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Byte comparison that does not short-circuit, for webhook token checks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_key_is_stable_per_body() {
        let a = fallback_idempotency_key(b"{\"event\":\"X\"}");
        let b = fallback_idempotency_key(b"{\"event\":\"X\"}");
        let c = fallback_idempotency_key(b"{\"event\":\"Y\"}");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"token1"));
        assert!(!constant_time_eq(b"token", b"tokem"));
    }
}
