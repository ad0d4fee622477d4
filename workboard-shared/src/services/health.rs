use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use super::error::{ServiceError, ServiceResult};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Pings the store and reports the current time
pub async fn check_health(store: &dyn Store) -> ServiceResult<HealthStatus> {
    store.ping().await.map_err(|e| {
        error!(error = %e, "Health check failed");
        ServiceError::HealthCheck(e.to_string())
    })?;

    Ok(HealthStatus {
        status: "ok",
        timestamp: Utc::now(),
    })
}
