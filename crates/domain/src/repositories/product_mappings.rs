use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::product_mappings::{
    InsertProductMappingEntity, ProductMappingEntity, UpdateProductMappingEntity,
};

#[async_trait]
#[automock]
pub trait ProductMappingRepository {
    /// Resolves the mapping for a purchase. An exact `(product_id, offer_id)`
    /// match wins over a product-wide mapping with no offer.
    async fn find_active(
        &self,
        provider: &str,
        product_id: &str,
        offer_id: Option<&str>,
    ) -> Result<Option<ProductMappingEntity>>;

    async fn list_by_provider(&self, provider: &str) -> Result<Vec<ProductMappingEntity>>;

    async fn insert(
        &self,
        insert_product_mapping_entity: InsertProductMappingEntity,
    ) -> Result<Uuid>;

    async fn update(
        &self,
        mapping_id: Uuid,
        changeset: UpdateProductMappingEntity,
    ) -> Result<bool>;

    async fn delete(&self, mapping_id: Uuid) -> Result<bool>;
}
