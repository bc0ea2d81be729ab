//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Expired OTP challenge purge (every minute)
//!
//! Verification already evicts an expired challenge when it is looked up;
//! the purge only reclaims rows for numbers that never came back.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let purge_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            if let Err(e) = run_challenge_purge(&deps).await {
                tracing::error!("Challenge purge task failed: {}", e);
            }
        })
    })?;

    scheduler.add(purge_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (expired challenge purge every minute)");
    Ok(scheduler)
}

/// Remove challenges that expired before now
pub async fn run_challenge_purge(deps: &ServerDeps) -> Result<u64> {
    let purged = deps.challenges.purge_expired(deps.now()).await?;
    if purged > 0 {
        tracing::debug!(purged, "Purged expired OTP challenges");
    }
    Ok(purged)
}
