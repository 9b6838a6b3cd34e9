use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entities::product_mappings::ProductMappingEntity, value_objects::enums::plan_types::PlanType};

#[derive(Debug, Clone, Serialize)]
pub struct ProductMappingDto {
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

impl From<ProductMappingEntity> for ProductMappingDto {
    fn from(entity: ProductMappingEntity) -> Self {
        Self {
            id: entity.id,
            provider: entity.provider,
            product_id: entity.product_id,
            offer_id: entity.offer_id,
            plan_type: entity.plan_type,
            duration_days: entity.duration_days,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProductMappingModel {
    pub product_id: String,
    pub offer_id: Option<String>,
    pub plan_type: PlanType,
    pub duration_days: Option<i32>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductMappingModel {
    pub product_id: Option<String>,
    pub offer_id: Option<Option<String>>,
    pub plan_type: Option<PlanType>,
    pub duration_days: Option<Option<i32>>,
    pub is_active: Option<bool>,
}
