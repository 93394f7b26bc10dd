//! Cron-driven lifecycle jobs.
//!
//! All cadences are anchored to Asia/Seoul: the boards, their posting
//! rhythms, and the people reading the report all live there.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use hotdeal_core::AppConfig;

use crate::jobs;

/// Hourly expiry sweep, on the hour.
const EXPIRY_SCHEDULE: &str = "0 0 * * * *";
/// Daily report at 09:00 KST.
const REPORT_SCHEDULE: &str = "0 0 9 * * *";
/// Weekly maintenance, Sunday 06:00 KST.
const MAINTENANCE_SCHEDULE: &str = "0 0 6 * * SUN";

#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub jobs: usize,
    pub next_job_in_secs: Option<u64>,
}

/// Owns the cron scheduler and its registered job ids.
///
/// Explicitly constructed and handed to whoever needs it; `start` and `stop`
/// are idempotent so a double start is a logged no-op, not a second set of
/// jobs.
pub struct DealScheduler {
    inner: Option<JobScheduler>,
    job_ids: Vec<Uuid>,
}

impl DealScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: None,
            job_ids: Vec::new(),
        }
    }

    /// Registers the expiry, report, and maintenance jobs and starts firing.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] when the scheduler cannot be built or a
    /// job cannot be registered.
    pub async fn start(
        &mut self,
        pool: PgPool,
        config: Arc<AppConfig>,
    ) -> Result<(), JobSchedulerError> {
        if self.inner.is_some() {
            tracing::warn!("scheduler: already running, start ignored");
            return Ok(());
        }

        let scheduler = JobScheduler::new().await?;

        self.job_ids.push(
            scheduler
                .add(expiry_job(pool.clone(), Arc::clone(&config))?)
                .await?,
        );
        self.job_ids.push(scheduler.add(report_job(pool.clone())?).await?);
        self.job_ids
            .push(scheduler.add(maintenance_job(pool, config)?).await?);

        scheduler.start().await?;
        tracing::info!(jobs = self.job_ids.len(), "scheduler: started");
        self.inner = Some(scheduler);
        Ok(())
    }

    /// Shuts the scheduler down; stopping a stopped scheduler is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] when shutdown fails.
    pub async fn stop(&mut self) -> Result<(), JobSchedulerError> {
        match self.inner.take() {
            Some(mut scheduler) => {
                scheduler.shutdown().await?;
                self.job_ids.clear();
                tracing::info!("scheduler: stopped");
                Ok(())
            }
            None => {
                tracing::warn!("scheduler: not running, stop ignored");
                Ok(())
            }
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let next_job_in_secs = match &self.inner {
            Some(scheduler) => scheduler
                .clone()
                .time_till_next_job()
                .await
                .ok()
                .flatten()
                .map(|d| d.as_secs()),
            None => None,
        };
        SchedulerStatus {
            running: self.inner.is_some(),
            jobs: self.job_ids.len(),
            next_job_in_secs,
        }
    }
}

impl Default for DealScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn expiry_job(pool: PgPool, config: Arc<AppConfig>) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(EXPIRY_SCHEDULE, chrono_tz::Asia::Seoul, move |_uuid, _lock| {
        let pool = pool.clone();
        let config = Arc::clone(&config);
        Box::pin(async move {
            tracing::info!("scheduler: starting hourly expiry sweep");
            match jobs::run_expiry_job(&pool, &config).await {
                Ok(stats) => tracing::info!(
                    expired = stats.expired,
                    expiring_soon = stats.expiring_soon,
                    errors = stats.errors,
                    "scheduler: hourly expiry sweep complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: expiry sweep failed"),
            }
        })
    })
}

fn report_job(pool: PgPool) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(REPORT_SCHEDULE, chrono_tz::Asia::Seoul, move |_uuid, _lock| {
        let pool = pool.clone();
        Box::pin(async move {
            tracing::info!("scheduler: generating daily report");
            if let Err(e) = jobs::run_report_job(&pool).await {
                tracing::error!(error = %e, "scheduler: daily report failed");
            }
        })
    })
}

fn maintenance_job(pool: PgPool, config: Arc<AppConfig>) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(
        MAINTENANCE_SCHEDULE,
        chrono_tz::Asia::Seoul,
        move |_uuid, _lock| {
            let pool = pool.clone();
            let config = Arc::clone(&config);
            Box::pin(async move {
                tracing::info!("scheduler: starting weekly maintenance");
                match jobs::run_maintenance_job(&pool, &config).await {
                    Ok(stats) => tracing::info!(
                        checked = stats.total_checked,
                        expired = stats.expired,
                        "scheduler: weekly maintenance complete"
                    ),
                    Err(e) => tracing::error!(error = %e, "scheduler: weekly maintenance failed"),
                }
            })
        },
    )
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
