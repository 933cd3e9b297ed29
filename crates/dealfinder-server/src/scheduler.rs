//! Background job scheduler.
//!
//! Sessions live in memory only, so a nightly job drops free sessions that
//! have been idle since before today.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::Quota;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(quota: Arc<Quota>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_session_prune_job(&scheduler, quota).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the nightly session prune, five minutes after UTC midnight
/// (`0 5 0 * * *`) so the day rollover has already happened.
async fn register_session_prune_job(
    scheduler: &JobScheduler,
    quota: Arc<Quota>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 5 0 * * *", move |_uuid, _lock| {
        let quota = Arc::clone(&quota);

        Box::pin(async move {
            let removed = quota.prune_idle();
            tracing::info!(
                removed,
                remaining = quota.store().len(),
                "scheduler: session prune complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered session prune job (daily 00:05 UTC)");
    Ok(())
}
