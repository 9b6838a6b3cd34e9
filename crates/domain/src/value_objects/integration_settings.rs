use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::integration_settings::IntegrationSettingsEntity;

/// API representation of provider credentials. Secrets are never returned in
/// full; only the last four characters survive masking.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationSettingsDto {
    pub provider: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<IntegrationSettingsEntity> for IntegrationSettingsDto {
    fn from(entity: IntegrationSettingsEntity) -> Self {
        Self {
            provider: entity.provider,
            client_id: entity.client_id.as_deref().map(mask_secret),
            client_secret: entity.client_secret.as_deref().map(mask_secret),
            webhook_secret: entity.webhook_secret.as_deref().map(mask_secret),
            is_active: entity.is_active,
            updated_at: entity.updated_at,
        }
    }
}

/// Secret fields left as `None` keep their stored value, so the admin panel
/// can toggle `is_active` without re-entering credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIntegrationSettingsModel {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_active: Option<bool>,
}

pub fn mask_secret(secret: &str) -> String {
    // Counted in characters, not bytes, so multi-byte secrets never split.
    let visible = 4;
    let total = secret.chars().count();
    if total <= visible {
        return "*".repeat(total);
    }
    let masked_len = total - visible;
    let tail: String = secret.chars().skip(masked_len).collect();
    format!("{}{}", "*".repeat(masked_len), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_only_last_four_characters() {
        assert_eq!(mask_secret("hottok-1234567890"), "*************7890");
    }

    #[test]
    fn mask_handles_multibyte_secrets() {
        assert_eq!(mask_secret("sécret-clé"), "******-clé");
        assert_eq!(mask_secret("ééé"), "***");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret("ab"), "**");
        assert_eq!(mask_secret(""), "");
    }
}
