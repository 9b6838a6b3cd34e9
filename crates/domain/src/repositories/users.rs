use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::{
    subscriptions::SubscriptionEntity,
    users::{InsertUserEntity, UserEntity},
};
use crate::value_objects::users::UserFilter;

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;

    /// Inserts the user or returns the existing row when the email is taken.
    async fn upsert_by_email(&self, insert_user_entity: InsertUserEntity) -> Result<UserEntity>;

    /// Pages users together with their subscription row (left join) plus the
    /// total count matching the filter.
    async fn list_with_subscription(
        &self,
        filter: UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(UserEntity, Option<SubscriptionEntity>)>, i64)>;
}
