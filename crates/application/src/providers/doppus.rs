use anyhow::{Result, bail};
use domain::value_objects::lifecycle::SubscriptionEvent;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::NormalizedWebhook;

type HmacSha256 = Hmac<Sha256>;

/// Doppus signs the raw body with HMAC-SHA256 and sends the hex digest in
/// the `X-Doppus-Signature` header.
pub fn verify_signature(secret: &str, body: &[u8], provided: Option<&str>) -> bool {
    let Some(signature) = provided else {
        return false;
    };
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub fn map_status(status: &str) -> Option<SubscriptionEvent> {
    match status {
        "approved" | "paid" => Some(SubscriptionEvent::PurchaseApproved),
        "delayed" => Some(SubscriptionEvent::PaymentOverdue),
        "canceled" => Some(SubscriptionEvent::Canceled),
        "refunded" => Some(SubscriptionEvent::Refunded),
        "chargeback" => Some(SubscriptionEvent::Chargeback),
        "expired" => Some(SubscriptionEvent::Expired),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DoppusEnvelope {
    status: Option<String>,
    customer: Option<DoppusCustomer>,
    transaction: Option<DoppusTransaction>,
    product: Option<DoppusProduct>,
    plan: Option<DoppusPlan>,
    recurrence: Option<DoppusRecurrence>,
}

#[derive(Debug, Deserialize)]
struct DoppusCustomer {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoppusTransaction {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoppusProduct {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoppusPlan {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoppusRecurrence {
    code: Option<String>,
}

pub fn parse(payload: &serde_json::Value) -> Result<NormalizedWebhook> {
    let envelope: DoppusEnvelope = serde_json::from_value(payload.clone())?;

    let Some(status) = envelope.status else {
        bail!("payload has no status field");
    };

    Ok(NormalizedWebhook {
        action: map_status(&status),
        event_type: status,
        payer_email: envelope
            .customer
            .as_ref()
            .and_then(|c| c.email.clone())
            .map(|email| email.to_lowercase()),
        payer_name: envelope.customer.and_then(|c| c.name),
        transaction_id: envelope.transaction.and_then(|t| t.code),
        provider_subscription_id: envelope.recurrence.and_then(|r| r.code),
        product_id: envelope.product.and_then(|p| p.code),
        offer_id: envelope.plan.and_then(|p| p.code),
    })
}
