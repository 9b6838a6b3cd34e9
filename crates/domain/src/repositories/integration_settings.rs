use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::entities::integration_settings::{
    InsertIntegrationSettingsEntity, IntegrationSettingsEntity,
};

#[async_trait]
#[automock]
pub trait IntegrationSettingsRepository {
    async fn find_by_provider(&self, provider: &str)
    -> Result<Option<IntegrationSettingsEntity>>;

    async fn upsert(
        &self,
        insert_integration_settings_entity: InsertIntegrationSettingsEntity,
    ) -> Result<IntegrationSettingsEntity>;
}
