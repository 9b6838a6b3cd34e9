use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
    },
    repositories::subscriptions::SubscriptionRepository,
    schema::{subscriptions, users},
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus, lifecycle,
        subscriptions::SubscriptionFilter,
    },
};

use crate::postgres::postgres_connection::PgPoolSquad;

pub struct SubscriptionsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionsPostgres {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, insert_subscription_entity: InsertSubscriptionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(subscriptions::table)
            .values(&insert_subscription_entity)
            .returning(subscriptions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn update_with_version(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        changeset: UpdateSubscriptionEntity,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The version predicate is what makes this a compare-and-swap: a
        // concurrent writer bumps the version and this update touches 0 rows.
        let affected = diesel::update(
            subscriptions::table
                .find(subscription_id)
                .filter(subscriptions::version.eq(expected_version)),
        )
        .set(&changeset)
        .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn delete(&self, subscription_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected =
            diesel::delete(subscriptions::table.find(subscription_id)).execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn find_page(
        &self,
        filter: SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(SubscriptionEntity, String)>, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table
            .inner_join(users::table)
            .select((SubscriptionEntity::as_select(), users::email))
            .into_boxed();
        let mut count_query = subscriptions::table.inner_join(users::table).into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(subscriptions::status.eq(status.to_string()));
            count_query = count_query.filter(subscriptions::status.eq(status.to_string()));
        }
        if let Some(provider) = filter.provider {
            query = query.filter(subscriptions::provider.eq(provider.to_string()));
            count_query = count_query.filter(subscriptions::provider.eq(provider.to_string()));
        }
        if let Some(plan_type) = filter.plan_type {
            query = query.filter(subscriptions::plan_type.eq(plan_type.to_string()));
            count_query = count_query.filter(subscriptions::plan_type.eq(plan_type.to_string()));
        }
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            // `name` is nullable, so lift `email` to keep the or() types aligned.
            let pattern = format!("%{}%", search);
            query = query.filter(
                users::email
                    .nullable()
                    .ilike(pattern.clone())
                    .or(users::name.ilike(pattern.clone())),
            );
            count_query = count_query.filter(
                users::email
                    .nullable()
                    .ilike(pattern.clone())
                    .or(users::name.ilike(pattern)),
            );
        }

        let rows = query
            .order(subscriptions::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<(SubscriptionEntity, String)>(&mut conn)?;

        let total = count_query.count().get_result::<i64>(&mut conn)?;

        Ok((rows, total))
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = diesel::update(
            subscriptions::table
                .filter(subscriptions::lifetime.eq(false))
                .filter(subscriptions::ends_at.le(now))
                .filter(
                    subscriptions::status
                        .eq_any(lifecycle::LIVE_STATUSES.map(|status| status.to_string())),
                ),
        )
        .set((
            subscriptions::status.eq(SubscriptionStatus::Expired.to_string()),
            subscriptions::version.eq(subscriptions::version + 1),
            subscriptions::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

        Ok(affected)
    }
}
