use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::entities::subscriptions::{
    InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
};
use crate::value_objects::subscriptions::SubscriptionFilter;

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn insert(&self, insert_subscription_entity: InsertSubscriptionEntity) -> Result<Uuid>;

    /// Applies the changeset only when the stored `version` still equals
    /// `expected_version`. Returns `false` when another writer got there
    /// first; the caller re-reads and retries.
    async fn update_with_version(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        changeset: UpdateSubscriptionEntity,
    ) -> Result<bool>;

    async fn delete(&self, subscription_id: Uuid) -> Result<bool>;

    /// Pages subscriptions joined with the owning user's email plus the total
    /// count matching the filter.
    async fn find_page(
        &self,
        filter: SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(SubscriptionEntity, String)>, i64)>;

    /// Moves non-lifetime `active`/`past_due` rows whose period ended before
    /// `now` to `expired`. Returns the number of rows swept.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<usize>;
}
