use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use domain::{
    entities::webhook_events::{InsertWebhookEventEntity, WebhookEventEntity},
    repositories::webhook_events::WebhookEventRepository,
    schema::webhook_events,
    value_objects::{
        enums::webhook_event_statuses::WebhookEventStatus, webhook_events::WebhookEventFilter,
    },
};

use crate::postgres::postgres_connection::PgPoolSquad;

pub struct WebhookEventsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WebhookEventsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WebhookEventRepository for WebhookEventsPostgres {
    async fn insert_if_absent(
        &self,
        insert_webhook_event_entity: InsertWebhookEventEntity,
    ) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The unique index on (provider, idempotency_key) turns redelivery
        // into a no-op insert.
        let result = diesel::insert_into(webhook_events::table)
            .values(&insert_webhook_event_entity)
            .on_conflict((webhook_events::provider, webhook_events::idempotency_key))
            .do_nothing()
            .returning(webhook_events::id)
            .get_result::<Uuid>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn lock_next_pending(&self) -> Result<Option<WebhookEventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let worker_id = Uuid::new_v4().to_string();
        let current_time = Utc::now();

        // Transaction so the row lock from FOR UPDATE SKIP LOCKED holds until
        // the status flips to processing.
        let event =
            conn.transaction::<Option<WebhookEventEntity>, diesel::result::Error, _>(|conn| {
                let candidate: Option<WebhookEventEntity> = webhook_events::table
                    .select(WebhookEventEntity::as_select())
                    .filter(webhook_events::status.eq(WebhookEventStatus::Pending.to_string()))
                    .filter(webhook_events::run_at.le(current_time))
                    .order(webhook_events::run_at.asc())
                    .for_update()
                    .skip_locked()
                    .first::<WebhookEventEntity>(conn)
                    .optional()?;

                if let Some(event) = candidate {
                    let claimed = diesel::update(webhook_events::table.find(event.id))
                        .set((
                            webhook_events::status
                                .eq(WebhookEventStatus::Processing.to_string()),
                            webhook_events::locked_at.eq(Some(current_time)),
                            webhook_events::locked_by.eq(Some(worker_id)),
                        ))
                        .returning(WebhookEventEntity::as_select())
                        .get_result::<WebhookEventEntity>(conn)?;
                    Ok(Some(claimed))
                } else {
                    Ok(None)
                }
            })?;

        Ok(event)
    }

    async fn mark_processed(&self, event_id: Uuid, note: Option<&str>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(webhook_events::table.find(event_id))
            .set((
                webhook_events::status.eq(WebhookEventStatus::Processed.to_string()),
                webhook_events::error.eq(note),
                webhook_events::processed_at.eq(Some(Utc::now())),
                webhook_events::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                webhook_events::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_terminal_failure(&self, event_id: Uuid, error: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(webhook_events::table.find(event_id))
            .set((
                webhook_events::status.eq(WebhookEventStatus::Failed.to_string()),
                webhook_events::error.eq(Some(error)),
                webhook_events::processed_at.eq(Some(Utc::now())),
                webhook_events::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                webhook_events::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_retryable_failure(
        &self,
        event_id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let event = webhook_events::table
            .find(event_id)
            .select(WebhookEventEntity::as_select())
            .first::<WebhookEventEntity>(&mut conn)?;

        let new_attempts = event.attempts + 1;
        let (new_status, next_run_at) = if new_attempts < max_attempts {
            // Exponential backoff: 5s, 25s, 125s...
            let backoff_sec = 5 * 5_i64.pow((new_attempts - 1) as u32);
            (
                WebhookEventStatus::Pending,
                current_time + chrono::Duration::seconds(backoff_sec),
            )
        } else {
            (WebhookEventStatus::Dead, current_time)
        };

        diesel::update(webhook_events::table.find(event_id))
            .set((
                webhook_events::status.eq(new_status.to_string()),
                webhook_events::attempts.eq(new_attempts),
                webhook_events::error.eq(Some(error)),
                webhook_events::run_at.eq(next_run_at),
                webhook_events::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                webhook_events::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn reset_for_reprocess(&self, event_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Only settled events may be requeued; pending/processing rows are
        // already owned by the queue.
        let affected = diesel::update(
            webhook_events::table
                .find(event_id)
                .filter(webhook_events::status.eq_any(vec![
                    WebhookEventStatus::Processed.to_string(),
                    WebhookEventStatus::Failed.to_string(),
                    WebhookEventStatus::Dead.to_string(),
                ])),
        )
        .set((
            webhook_events::status.eq(WebhookEventStatus::Pending.to_string()),
            webhook_events::attempts.eq(0),
            webhook_events::error.eq::<Option<String>>(None),
            webhook_events::run_at.eq(Utc::now()),
            webhook_events::processed_at.eq::<Option<chrono::DateTime<Utc>>>(None),
            webhook_events::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
            webhook_events::locked_by.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<WebhookEventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = webhook_events::table
            .find(event_id)
            .select(WebhookEventEntity::as_select())
            .first::<WebhookEventEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_page(
        &self,
        filter: WebhookEventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<WebhookEventEntity>, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = webhook_events::table
            .select(WebhookEventEntity::as_select())
            .into_boxed();
        let mut count_query = webhook_events::table.into_boxed();

        if let Some(provider) = filter.provider {
            query = query.filter(webhook_events::provider.eq(provider.to_string()));
            count_query = count_query.filter(webhook_events::provider.eq(provider.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(webhook_events::status.eq(status.to_string()));
            count_query = count_query.filter(webhook_events::status.eq(status.to_string()));
        }
        if let Some(email) = filter
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let pattern = format!("%{}%", email);
            query = query.filter(webhook_events::payer_email.ilike(pattern.clone()));
            count_query = count_query.filter(webhook_events::payer_email.ilike(pattern));
        }

        let rows = query
            .order(webhook_events::received_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<WebhookEventEntity>(&mut conn)?;

        let total = count_query.count().get_result::<i64>(&mut conn)?;

        Ok((rows, total))
    }
}
