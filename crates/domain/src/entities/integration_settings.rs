use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::integration_settings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = integration_settings)]
pub struct IntegrationSettingsEntity {
    pub id: Uuid,
    pub provider: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = integration_settings)]
pub struct InsertIntegrationSettingsEntity {
    pub provider: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_active: bool,
}
