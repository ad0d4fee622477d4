//! # Workboard Shared Library
//!
//! Domain types, persistence and business logic shared by the Workboard API
//! server and the maintenance worker.
//!
//! ## Module Organization
//!
//! - `models`: row types and their SQL
//! - `store`: the `Store` trait with Postgres and in-memory implementations
//! - `auth`: password hashing, JWTs, bearer middleware, access checks
//! - `services`: guarded, audited use cases
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Workboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
