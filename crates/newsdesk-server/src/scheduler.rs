//! Background job scheduler.
//!
//! Registers the repeated collection job at server startup. The first run is
//! spawned separately by `main` so it does not wait a full interval.

use std::{sync::Arc, time::Duration};

use newsdesk_scraper::Collector;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Call `shutdown` on it to stop the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    collector: Arc<Collector>,
    interval_minutes: u64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let interval = Duration::from_secs(interval_minutes.saturating_mul(60));
    register_collection_job(&scheduler, collector, interval).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the collection job, repeating every `interval`.
async fn register_collection_job(
    scheduler: &JobScheduler,
    collector: Arc<Collector>,
    interval: Duration,
) -> Result<(), JobSchedulerError> {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: registering collection job"
    );

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let collector = Arc::clone(&collector);

        Box::pin(async move {
            run_scheduled_collection(&collector).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Run one collection pass unless another is still in flight.
///
/// Errors are logged; the next tick tries again.
pub async fn run_scheduled_collection(collector: &Collector) {
    match collector.try_run().await {
        None => {}
        Some(Ok(summary)) => {
            tracing::info!(
                run_number = summary.run_number,
                inserted = summary.inserted,
                "scheduler: collection run finished"
            );
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "scheduler: collection run failed");
        }
    }
}
