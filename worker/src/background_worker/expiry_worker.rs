use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use domain::repositories::subscriptions::SubscriptionRepository;

/// Periodic sweep that moves lapsed non-lifetime subscriptions to `expired`.
/// Providers do not always send an expiry webhook, so the sweep is the
/// backstop that keeps access in line with the paid period.
pub async fn run<S>(
    subscription_repo: Arc<S>,
    sweep_interval_secs: u64,
) -> Result<()>
where
    S: SubscriptionRepository + Send + Sync,
{
    info!("Starting subscription expiry sweep loop");
    loop {
        match subscription_repo.expire_lapsed(Utc::now()).await {
            Ok(0) => {}
            Ok(swept) => {
                info!(swept, "Expiry sweep moved lapsed subscriptions to expired");
            }
            Err(err) => {
                error!("Expiry sweep failed: {}", err);
            }
        }
        tokio::time::sleep(Duration::from_secs(sweep_interval_secs)).await;
    }
}
