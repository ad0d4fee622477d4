/// Daily maintenance job
///
/// Three independent steps run in order:
///
/// 1. `send_daily_digest`: one mock digest line per user email
/// 2. `cleanup_expired`: drops invitations and refresh tokens past expiry
/// 3. `recompute_project_stats`: per-project task counts by status
///
/// A failing step is logged and does not stop the ones after it. Nothing
/// guards against two runs overlapping.

use chrono::{DateTime, Utc};
use tracing::{error, info};
use workboard_shared::models::project::ProjectStats;
use workboard_shared::store::{Store, StoreResult};

/// Rows removed by `cleanup_expired`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupCounts {
    pub invitations: u64,
    pub refresh_tokens: u64,
}

/// Outcome of one maintenance run; `None` marks a failed step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub digests_sent: Option<usize>,
    pub cleanup: Option<CleanupCounts>,
    pub project_stats: Option<Vec<ProjectStats>>,
}

impl MaintenanceReport {
    pub fn is_complete(&self) -> bool {
        self.digests_sent.is_some() && self.cleanup.is_some() && self.project_stats.is_some()
    }
}

/// Logs a digest line for every user; no mail is actually sent
pub async fn send_daily_digest(store: &dyn Store) -> StoreResult<usize> {
    let emails = store.list_user_emails().await?;

    for email in &emails {
        info!(email = %email, "Sending daily digest");
    }

    Ok(emails.len())
}

/// Deletes invitations and refresh tokens that expired before `now`
pub async fn cleanup_expired(store: &dyn Store, now: DateTime<Utc>) -> StoreResult<CleanupCounts> {
    let invitations = store.delete_expired_invitations(now).await?;
    let refresh_tokens = store.delete_expired_refresh_tokens(now).await?;

    info!(invitations, refresh_tokens, "Expired rows removed");
    Ok(CleanupCounts {
        invitations,
        refresh_tokens,
    })
}

pub async fn recompute_project_stats(store: &dyn Store) -> StoreResult<Vec<ProjectStats>> {
    let stats = store.project_stats().await?;

    for project in &stats {
        info!(
            project_id = project.project_id,
            name = %project.name,
            todo = project.todo,
            in_progress = project.in_progress,
            done = project.done,
            "Project stats"
        );
    }

    Ok(stats)
}

/// Runs every step once
pub async fn run_maintenance(store: &dyn Store, now: DateTime<Utc>) -> MaintenanceReport {
    info!(%now, "Maintenance run starting");

    let digests_sent = send_daily_digest(store)
        .await
        .map_err(|e| error!(error = %e, "Daily digest failed"))
        .ok();

    let cleanup = cleanup_expired(store, now)
        .await
        .map_err(|e| error!(error = %e, "Expired row cleanup failed"))
        .ok();

    let project_stats = recompute_project_stats(store)
        .await
        .map_err(|e| error!(error = %e, "Project stats failed"))
        .ok();

    let report = MaintenanceReport {
        digests_sent,
        cleanup,
        project_stats,
    };

    info!(complete = report.is_complete(), "Maintenance run finished");
    report
}
