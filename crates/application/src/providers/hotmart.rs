use anyhow::{Result, bail};
use domain::value_objects::lifecycle::SubscriptionEvent;
use serde::Deserialize;

use super::{NormalizedWebhook, constant_time_eq};

/// Hotmart authenticates webhooks with a shared token sent in the
/// `X-Hotmart-Hottok` header.
pub fn verify_hottok(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(token) => constant_time_eq(expected.as_bytes(), token.as_bytes()),
        None => false,
    }
}

pub fn map_event(event: &str) -> Option<SubscriptionEvent> {
    match event {
        "PURCHASE_APPROVED" | "PURCHASE_COMPLETE" => Some(SubscriptionEvent::PurchaseApproved),
        "PURCHASE_DELAYED" => Some(SubscriptionEvent::PaymentOverdue),
        "PURCHASE_CANCELED" | "SUBSCRIPTION_CANCELLATION" => Some(SubscriptionEvent::Canceled),
        "PURCHASE_REFUNDED" => Some(SubscriptionEvent::Refunded),
        "PURCHASE_CHARGEBACK" => Some(SubscriptionEvent::Chargeback),
        "PURCHASE_EXPIRED" => Some(SubscriptionEvent::Expired),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct HotmartEnvelope {
    event: Option<String>,
    data: Option<HotmartData>,
    // Legacy (v1) deliveries are flat.
    email: Option<String>,
    name: Option<String>,
    prod: Option<serde_json::Value>,
    off: Option<String>,
    transaction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotmartData {
    purchase: Option<HotmartPurchase>,
    buyer: Option<HotmartBuyer>,
    product: Option<HotmartProduct>,
    subscription: Option<HotmartSubscription>,
}

#[derive(Debug, Deserialize)]
struct HotmartPurchase {
    transaction: Option<String>,
    offer: Option<HotmartOffer>,
}

#[derive(Debug, Deserialize)]
struct HotmartOffer {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotmartBuyer {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotmartProduct {
    id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HotmartSubscription {
    subscriber: Option<HotmartSubscriber>,
}

#[derive(Debug, Deserialize)]
struct HotmartSubscriber {
    code: Option<String>,
}

fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalizes both the current (v2, `event` + `data`) and legacy flat
/// payload shapes.
pub fn parse(payload: &serde_json::Value) -> Result<NormalizedWebhook> {
    let envelope: HotmartEnvelope = serde_json::from_value(payload.clone())?;

    let Some(event_type) = envelope.event.clone() else {
        // Legacy deliveries have no event name; the purchase status is all
        // there is.
        if envelope.email.is_none() && envelope.transaction.is_none() {
            bail!("payload carries neither an event name nor legacy purchase fields");
        }
        return Ok(NormalizedWebhook {
            event_type: "PURCHASE_APPROVED".to_string(),
            action: Some(SubscriptionEvent::PurchaseApproved),
            payer_email: envelope.email.map(|email| email.to_lowercase()),
            payer_name: envelope.name,
            transaction_id: envelope.transaction,
            provider_subscription_id: None,
            product_id: envelope.prod.as_ref().and_then(id_to_string),
            offer_id: envelope.off,
        });
    };

    let data = envelope.data;
    let purchase = data.as_ref().and_then(|d| d.purchase.as_ref());
    let buyer = data.as_ref().and_then(|d| d.buyer.as_ref());

    Ok(NormalizedWebhook {
        action: map_event(&event_type),
        event_type,
        payer_email: buyer
            .and_then(|b| b.email.clone())
            .map(|email| email.to_lowercase()),
        payer_name: buyer.and_then(|b| b.name.clone()),
        transaction_id: purchase.and_then(|p| p.transaction.clone()),
        provider_subscription_id: data
            .as_ref()
            .and_then(|d| d.subscription.as_ref())
            .and_then(|s| s.subscriber.as_ref())
            .and_then(|s| s.code.clone()),
        product_id: data
            .as_ref()
            .and_then(|d| d.product.as_ref())
            .and_then(|p| p.id.as_ref())
            .and_then(id_to_string),
        offer_id: purchase
            .and_then(|p| p.offer.as_ref())
            .and_then(|o| o.code.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_v2_purchase_payload() {
        let payload = json!({
            "id": "evt-1",
            "event": "PURCHASE_APPROVED",
            "data": {
                "purchase": {
                    "transaction": "HP17364812345",
                    "offer": { "code": "nd0f4bjy" }
                },
                "buyer": { "email": "Ana@Example.com", "name": "Ana" },
                "product": { "id": 123456 },
                "subscription": { "subscriber": { "code": "SUB-9" } }
            }
        });

        let normalized = parse(&payload).unwrap();
        assert_eq!(normalized.event_type, "PURCHASE_APPROVED");
        assert_eq!(normalized.action, Some(SubscriptionEvent::PurchaseApproved));
        assert_eq!(normalized.payer_email.as_deref(), Some("ana@example.com"));
        assert_eq!(normalized.transaction_id.as_deref(), Some("HP17364812345"));
        assert_eq!(normalized.provider_subscription_id.as_deref(), Some("SUB-9"));
        assert_eq!(normalized.product_id.as_deref(), Some("123456"));
        assert_eq!(normalized.offer_id.as_deref(), Some("nd0f4bjy"));
    }

    #[test]
    fn parses_legacy_flat_payload_as_purchase() {
        let payload = json!({
            "email": "legacy@example.com",
            "name": "Legacy Buyer",
            "prod": "99887",
            "off": "abc123",
            "transaction": "HP000111"
        });

        let normalized = parse(&payload).unwrap();
        assert_eq!(normalized.action, Some(SubscriptionEvent::PurchaseApproved));
        assert_eq!(normalized.payer_email.as_deref(), Some("legacy@example.com"));
        assert_eq!(normalized.product_id.as_deref(), Some("99887"));
    }

    #[test]
    fn unmapped_event_has_no_action() {
        let payload = json!({
            "event": "PURCHASE_OUT_OF_SHOPPING_CART",
            "data": { "buyer": { "email": "x@example.com" } }
        });

        let normalized = parse(&payload).unwrap();
        assert_eq!(normalized.action, None);
        assert_eq!(normalized.event_type, "PURCHASE_OUT_OF_SHOPPING_CART");
    }

    #[test]
    fn rejects_payload_without_event_or_legacy_fields() {
        assert!(parse(&json!({ "foo": "bar" })).is_err());
    }

    #[test]
    fn hottok_must_match_exactly() {
        assert!(verify_hottok("secret-token", Some("secret-token")));
        assert!(!verify_hottok("secret-token", Some("other-token")));
        assert!(!verify_hottok("secret-token", None));
    }

    #[test]
    fn lifecycle_events_map_to_actions() {
        assert_eq!(
            map_event("SUBSCRIPTION_CANCELLATION"),
            Some(SubscriptionEvent::Canceled)
        );
        assert_eq!(
            map_event("PURCHASE_CHARGEBACK"),
            Some(SubscriptionEvent::Chargeback)
        );
        assert_eq!(map_event("PURCHASE_DELAYED"), Some(SubscriptionEvent::PaymentOverdue));
        assert_eq!(map_event("SWITCH_PLAN"), None);
    }
}
