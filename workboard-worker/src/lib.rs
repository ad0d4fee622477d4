//! # Workboard Worker Library
//!
//! Daily maintenance for Workboard: mock digests, expired row cleanup and
//! project statistics, driven by a cron schedule.
//!
//! ## Modules
//!
//! - `jobs`: the maintenance steps and a single full run
//! - `scheduler`: cron loop with cooperative shutdown
//! - `config`: environment configuration

pub mod config;
pub mod jobs;
pub mod scheduler;
