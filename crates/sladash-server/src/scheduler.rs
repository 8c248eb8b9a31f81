//! Background job scheduler.
//!
//! Registers the recurring check job at server startup. The job shares the
//! server's [`Checker`], so a scheduled run and an API-triggered run of the
//! same kind never overlap.

use std::sync::Arc;

use sladash_core::{AppConfig, CheckKind};
use sladash_db::PgRecordStore;
use sladash_prober::{CheckRequest, Checker, PipelineError};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

const SCHEDULER_SOURCE: &str = "scheduler";

/// Builds and starts the background job scheduler.
///
/// Returns `None` when `SLADASH_SCHEDULER_ENABLED` is false. Otherwise the
/// running [`JobScheduler`] handle must be kept alive for the lifetime of the
/// process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    checker: Arc<Checker>,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    if !config.scheduler_enabled {
        tracing::info!("scheduler: disabled by configuration");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;
    register_check_job(&scheduler, &config.schedule_cron, checker, pool).await?;
    scheduler.start().await?;
    Ok(Some(scheduler))
}

/// Register the recurring serviceability + availability run.
async fn register_check_job(
    scheduler: &JobScheduler,
    cron: &str,
    checker: Arc<Checker>,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let store = PgRecordStore::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let checker = Arc::clone(&checker);
        let store = store.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting check run");
            run_scheduled_checks(&checker, &store).await;
            tracing::info!("scheduler: check run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered check job");
    Ok(())
}

/// Serviceability first, then availability. A failure of one kind does not
/// skip the other.
async fn run_scheduled_checks(checker: &Checker, store: &PgRecordStore) {
    let request = CheckRequest::new(SCHEDULER_SOURCE);

    for kind in [CheckKind::Serviceability, CheckKind::Availability] {
        match checker.run_check(kind, &request, store).await {
            Ok(report) => {
                let summary = report.summary();
                tracing::info!(
                    kind = %kind,
                    total = summary.total,
                    successful = summary.successful,
                    failed = summary.failed,
                    "scheduler: check finished"
                );
            }
            Err(PipelineError::AlreadyRunning { .. }) => {
                tracing::info!(kind = %kind, "scheduler: check already running; skipping");
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "scheduler: check failed");
            }
        }
    }
}
