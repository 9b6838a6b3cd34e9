use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// `pending` rows are eligible for the worker; `dead` means all retry
/// attempts were exhausted, `failed` means the error was terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventStatus {
    Pending,
    Processing,
    Processed,
    Failed,
    Dead,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Pending => "pending",
            WebhookEventStatus::Processing => "processing",
            WebhookEventStatus::Processed => "processed",
            WebhookEventStatus::Failed => "failed",
            WebhookEventStatus::Dead => "dead",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(WebhookEventStatus::Pending),
            "processing" => Some(WebhookEventStatus::Processing),
            "processed" => Some(WebhookEventStatus::Processed),
            "failed" => Some(WebhookEventStatus::Failed),
            "dead" => Some(WebhookEventStatus::Dead),
            _ => None,
        }
    }
}

impl Display for WebhookEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
