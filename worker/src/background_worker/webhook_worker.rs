use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info};

use application::usecases::webhook_processor::WebhookProcessorUseCase;
use domain::repositories::{
    product_mappings::ProductMappingRepository, subscriptions::SubscriptionRepository,
    users::UserRepository, webhook_events::WebhookEventRepository,
};

/// Drains the webhook event queue. One event at a time, sleeping only when
/// the queue is empty, so a backlog is worked off as fast as the database
/// hands out rows.
pub async fn run<E, U, S, M>(
    webhook_processor_usecase: Arc<WebhookProcessorUseCase<E, U, S, M>>,
    poll_interval_secs: u64,
) -> Result<()>
where
    E: WebhookEventRepository + Send + Sync,
    U: UserRepository + Send + Sync,
    S: SubscriptionRepository + Send + Sync,
    M: ProductMappingRepository + Send + Sync,
{
    info!("Starting webhook worker loop");
    loop {
        match webhook_processor_usecase.run_once().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;
            }
            Err(err) => {
                error!("Error locking next webhook event: {}", err);
                tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;
            }
        }
    }
}
