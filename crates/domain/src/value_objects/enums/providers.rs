use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Origin of a subscription. `Manual` covers grants made from the admin
/// panel, which never go through the webhook pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Hotmart,
    Doppus,
    Manual,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hotmart => "hotmart",
            Provider::Doppus => "doppus",
            Provider::Manual => "manual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "hotmart" => Some(Provider::Hotmart),
            "doppus" => Some(Provider::Doppus),
            "manual" => Some(Provider::Manual),
            _ => None,
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
