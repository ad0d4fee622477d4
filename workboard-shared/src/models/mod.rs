/// Database models for Workboard
///
/// Each model owns its row type, its input types and the SQL that reads and
/// writes it. Query functions are generic over [`sqlx::PgExecutor`] so they
/// run equally against the pool or inside a transaction; the
/// [`crate::store::PgStore`] composes them into atomic units.
///
/// # Models
///
/// - `user`: accounts and profiles
/// - `refresh_token`: hashed refresh tokens
/// - `organization`: tenants, slug derivation
/// - `membership`: user/organization roles
/// - `invitation`: single-use membership tokens
/// - `project`: projects and per-status task statistics
/// - `task`: tasks and the status state machine
/// - `comment`: task comments
/// - `tag`: organization tags and task attachments
/// - `audit_log`: append-only audit trail
///
/// # Example
///
/// ```no_run
/// use workboard_shared::models::user::{User, CreateUser};
/// use workboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod audit_log;
pub mod comment;
pub mod invitation;
pub mod membership;
pub mod organization;
pub mod project;
pub mod refresh_token;
pub mod tag;
pub mod task;
pub mod user;
