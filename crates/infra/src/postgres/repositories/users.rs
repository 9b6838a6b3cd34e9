use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use domain::{
    entities::{
        subscriptions::SubscriptionEntity,
        users::{InsertUserEntity, UserEntity},
    },
    repositories::users::UserRepository,
    schema::{subscriptions, users},
    value_objects::users::UserFilter,
};

use crate::postgres::postgres_connection::PgPoolSquad;

pub struct UsersPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UsersPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UsersPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .find(user_id)
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert_by_email(&self, insert_user_entity: InsertUserEntity) -> Result<UserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // `do_nothing` returns no row on conflict, so fall back to a lookup.
        let inserted = diesel::insert_into(users::table)
            .values(&insert_user_entity)
            .on_conflict(users::email)
            .do_nothing()
            .returning(UserEntity::as_select())
            .get_result::<UserEntity>(&mut conn)
            .optional()?;

        match inserted {
            Some(user) => Ok(user),
            None => {
                let existing = users::table
                    .filter(users::email.eq(&insert_user_entity.email))
                    .select(UserEntity::as_select())
                    .first::<UserEntity>(&mut conn)?;

                if existing.name.is_none() && insert_user_entity.name.is_some() {
                    let updated = diesel::update(users::table.find(existing.id))
                        .set((
                            users::name.eq(&insert_user_entity.name),
                            users::updated_at.eq(Utc::now()),
                        ))
                        .returning(UserEntity::as_select())
                        .get_result::<UserEntity>(&mut conn)?;
                    return Ok(updated);
                }

                Ok(existing)
            }
        }
    }

    async fn list_with_subscription(
        &self,
        filter: UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(UserEntity, Option<SubscriptionEntity>)>, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = users::table
            .left_join(subscriptions::table)
            .select((
                UserEntity::as_select(),
                Option::<SubscriptionEntity>::as_select(),
            ))
            .into_boxed();
        let mut count_query = users::table.into_boxed();

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
            .order(users::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<(UserEntity, Option<SubscriptionEntity>)>(&mut conn)?;

        let total = count_query.count().get_result::<i64>(&mut conn)?;

        Ok((rows, total))
    }
}
