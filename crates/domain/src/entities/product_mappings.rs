use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::product_mappings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = product_mappings)]
pub struct ProductMappingEntity {
    pub id: Uuid,
    pub provider: String,
    pub product_id: String,
    pub offer_id: Option<String>,
    pub plan_type: String,
    pub duration_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = product_mappings)]
pub struct InsertProductMappingEntity {
    pub provider: String,
    pub product_id: String,
    pub offer_id: Option<String>,
    pub plan_type: String,
    pub duration_days: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = product_mappings)]
pub struct UpdateProductMappingEntity {
    pub product_id: Option<String>,
    pub offer_id: Option<Option<String>>,
    pub plan_type: Option<String>,
    pub duration_days: Option<Option<i32>>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}
