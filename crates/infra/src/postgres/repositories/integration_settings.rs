use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use domain::{
    entities::integration_settings::{
        InsertIntegrationSettingsEntity, IntegrationSettingsEntity,
    },
    repositories::integration_settings::IntegrationSettingsRepository,
    schema::integration_settings,
};

use crate::postgres::postgres_connection::PgPoolSquad;

pub struct IntegrationSettingsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl IntegrationSettingsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl IntegrationSettingsRepository for IntegrationSettingsPostgres {
    async fn find_by_provider(
        &self,
        provider: &str,
    ) -> Result<Option<IntegrationSettingsEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = integration_settings::table
            .filter(integration_settings::provider.eq(provider))
            .select(IntegrationSettingsEntity::as_select())
            .first::<IntegrationSettingsEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert(
        &self,
        insert_integration_settings_entity: InsertIntegrationSettingsEntity,
    ) -> Result<IntegrationSettingsEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(integration_settings::table)
            .values(&insert_integration_settings_entity)
            .on_conflict(integration_settings::provider)
            .do_update()
            .set((
                integration_settings::client_id
                    .eq(&insert_integration_settings_entity.client_id),
                integration_settings::client_secret
                    .eq(&insert_integration_settings_entity.client_secret),
                integration_settings::webhook_secret
                    .eq(&insert_integration_settings_entity.webhook_secret),
                integration_settings::is_active.eq(insert_integration_settings_entity.is_active),
                integration_settings::updated_at.eq(Utc::now()),
            ))
            .returning(IntegrationSettingsEntity::as_select())
            .get_result::<IntegrationSettingsEntity>(&mut conn)?;

        Ok(result)
    }
}
