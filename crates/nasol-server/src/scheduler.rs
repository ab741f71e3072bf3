//! Background job scheduler.
//!
//! Runs the news collection on `NASOL_COLLECT_CRON` inside the server
//! process, the same run the `scheduled-news-fetch` endpoint performs.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::AppState;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(state: AppState) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_collection_job(&scheduler, state).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_collection_job(
    scheduler: &JobScheduler,
    state: AppState,
) -> Result<(), JobSchedulerError> {
    let cron = state.config.collect_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let state = state.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting news collection run");
            let report =
                nasol_ingest::run_news_collection(&state.config, &state.program, state.store.as_ref())
                    .await;
            if report.success {
                tracing::info!(
                    collected = report.collected,
                    saved = report.saved,
                    "scheduler: news collection run complete"
                );
            } else {
                tracing::error!(
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "scheduler: news collection run failed"
                );
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered news collection job");
    Ok(())
}
