/// Cron-driven maintenance scheduler
///
/// Sleeps until the next fire time of a six-field cron expression
/// (`sec min hour day month weekday`), runs [`run_maintenance`], and repeats
/// until the shutdown token is cancelled. The default fires daily at
/// midnight UTC.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workboard_shared::store::MemoryStore;
/// use workboard_worker::scheduler::{MaintenanceScheduler, DEFAULT_SCHEDULE};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let scheduler = MaintenanceScheduler::new(Arc::new(MemoryStore::new()), DEFAULT_SCHEDULE)?;
/// let shutdown = scheduler.shutdown_token();
///
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shutdown.cancel();
/// });
///
/// scheduler.run().await;
/// # Ok(())
/// # }
/// ```

use crate::jobs::run_maintenance;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use workboard_shared::store::Store;

/// Every day at 00:00:00 UTC
pub const DEFAULT_SCHEDULE: &str = "0 0 0 * * *";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },
}

pub struct MaintenanceScheduler {
    store: Arc<dyn Store>,
    schedule: Schedule,
    shutdown_token: CancellationToken,
}

impl MaintenanceScheduler {
    pub fn new(store: Arc<dyn Store>, expression: &str) -> Result<Self, SchedulerError> {
        let schedule =
            Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidSchedule {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            store,
            schedule,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Token that stops `run` when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// First fire time strictly after `after`
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Runs maintenance on every tick until shutdown, returning the number of runs
    ///
    /// A run in progress is finished before shutdown is honoured.
    pub async fn run(&self) -> u64 {
        let mut runs = 0u64;
        let mut last_fire: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            // Never fire the same tick twice if a run finished early
            let from = last_fire.map_or(now, |fired| fired.max(now));

            let Some(next) = self.next_run_after(from) else {
                tracing::warn!("Schedule has no upcoming fire times, stopping");
                break;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next_run = %next, "Waiting for next maintenance run");

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            run_maintenance(self.store.as_ref(), Utc::now()).await;
            runs += 1;
            last_fire = Some(next);
        }

        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::time::Duration;
    use workboard_shared::store::MemoryStore;

    fn scheduler(expression: &str) -> Result<MaintenanceScheduler, SchedulerError> {
        MaintenanceScheduler::new(Arc::new(MemoryStore::new()), expression)
    }

    #[test]
    fn test_invalid_expression_rejected() {
        let err = scheduler("every day please").err().unwrap();
        assert!(matches!(err, SchedulerError::InvalidSchedule { .. }));
        assert!(err.to_string().contains("every day please"));
    }

    #[test]
    fn test_default_fires_at_midnight() {
        let scheduler = scheduler(DEFAULT_SCHEDULE).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap();

        let next = scheduler.next_run_after(at).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());

        // Exactly at midnight the following day is next
        let after = scheduler.next_run_after(next).unwrap();
        assert_eq!(after, Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_every_second_schedule() {
        let scheduler = scheduler("* * * * * *").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let next = scheduler.next_run_after(at).unwrap();
        assert_eq!(next.second(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick() {
        let scheduler = scheduler(DEFAULT_SCHEDULE).unwrap();
        scheduler.shutdown_token().cancel();

        assert_eq!(scheduler.run().await, 0);
    }

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let scheduler = Arc::new(scheduler("* * * * * *").unwrap());
        let shutdown = scheduler.shutdown_token();

        let handle = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run().await })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        shutdown.cancel();

        let runs = handle.await.unwrap();
        assert!(runs >= 1, "expected at least one run, got {}", runs);
    }
}
