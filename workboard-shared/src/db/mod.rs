/// PostgreSQL plumbing
///
/// - `pool`: connection pool construction and health checks
/// - `migrations`: embedded schema migrations from the workspace `migrations/` directory
///
/// Row types and their queries live in [`crate::models`]; the service layer
/// reaches them through [`crate::store::PgStore`].

pub mod migrations;
pub mod pool;
