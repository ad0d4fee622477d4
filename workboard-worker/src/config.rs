/// Worker configuration from the environment
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `MAINTENANCE_SCHEDULE`: Six-field cron expression (default: daily at
///   midnight UTC)

use crate::scheduler::DEFAULT_SCHEDULE;
use anyhow::Context;
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub schedule: String,
}

impl WorkerConfig {
    /// Reads `.env` if present, then the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let schedule =
            lookup("MAINTENANCE_SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());

        Ok(Self {
            database_url,
            max_connections,
            schedule,
        })
    }
}
