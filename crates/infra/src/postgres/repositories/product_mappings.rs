use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use domain::{
    entities::product_mappings::{
        InsertProductMappingEntity, ProductMappingEntity, UpdateProductMappingEntity,
    },
    repositories::product_mappings::ProductMappingRepository,
    schema::product_mappings,
};

use crate::postgres::postgres_connection::PgPoolSquad;

pub struct ProductMappingsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProductMappingsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProductMappingRepository for ProductMappingsPostgres {
    async fn find_active(
        &self,
        provider: &str,
        product_id: &str,
        offer_id: Option<&str>,
    ) -> Result<Option<ProductMappingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Exact (product, offer) match first, then a product-wide mapping
        // with no offer restriction.
        if let Some(offer_id) = offer_id {
            let exact = product_mappings::table
                .filter(product_mappings::provider.eq(provider))
                .filter(product_mappings::product_id.eq(product_id))
                .filter(product_mappings::offer_id.eq(offer_id))
                .filter(product_mappings::is_active.eq(true))
                .select(ProductMappingEntity::as_select())
                .first::<ProductMappingEntity>(&mut conn)
                .optional()?;
            if exact.is_some() {
                return Ok(exact);
            }
        }

        let product_wide = product_mappings::table
            .filter(product_mappings::provider.eq(provider))
            .filter(product_mappings::product_id.eq(product_id))
            .filter(product_mappings::offer_id.is_null())
            .filter(product_mappings::is_active.eq(true))
            .select(ProductMappingEntity::as_select())
            .first::<ProductMappingEntity>(&mut conn)
            .optional()?;

        Ok(product_wide)
    }

    async fn list_by_provider(&self, provider: &str) -> Result<Vec<ProductMappingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = product_mappings::table
            .filter(product_mappings::provider.eq(provider))
            .order(product_mappings::created_at.desc())
            .select(ProductMappingEntity::as_select())
            .load::<ProductMappingEntity>(&mut conn)?;

        Ok(result)
    }

    async fn insert(
        &self,
        insert_product_mapping_entity: InsertProductMappingEntity,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(product_mappings::table)
            .values(&insert_product_mapping_entity)
            .returning(product_mappings::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn update(&self, mapping_id: Uuid, changeset: UpdateProductMappingEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = diesel::update(product_mappings::table.find(mapping_id))
            .set(&changeset)
            .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn delete(&self, mapping_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected =
            diesel::delete(product_mappings::table.find(mapping_id)).execute(&mut conn)?;

        Ok(affected == 1)
    }
}
