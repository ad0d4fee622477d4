/// Persistence seam for the service layer
///
/// Services never touch a database handle directly; they receive a
/// `&dyn Store`. Two implementations ship with the crate:
///
/// - [`PgStore`]: PostgreSQL via sqlx. Every mutating method runs its
///   primary write(s) and the audit row in one transaction.
/// - [`MemoryStore`]: mutex-guarded in-memory state for tests and local
///   experiments. Every method is atomic under the lock.
///
/// # Audit entries
///
/// Mutating methods take an [`AuditEntry`]. The store fills in `entity_id`
/// with the row the method touched (the new id for creations, the invitation
/// id for invite/accept, the tag id for attach/detach) and writes it in the
/// same atomic unit as the mutation. When a method fails, neither the
/// mutation nor the audit row is persisted.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use workboard_shared::store::{MemoryStore, Store};
///
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::audit_log::{AuditEntry, AuditFilter, AuditLog};
use crate::models::comment::{Comment, CreateComment};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationRejection};
use crate::models::membership::Membership;
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectStats, UpdateProject};
use crate::models::refresh_token::{NewRefreshToken, RefreshToken};
use crate::models::tag::{CreateTag, Tag, TaskTag};
use crate::models::task::{CreateTask, NewTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The targeted row does not exist
    #[error("Record not found")]
    NotFound,

    /// A unique constraint was violated; carries the constraint name
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }

        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }

        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Constraint names reported in [`StoreError::Conflict`]
pub mod constraints {
    pub const USER_EMAIL: &str = "users_email_key";
    pub const ORGANIZATION_SLUG: &str = "organizations_slug_key";
    pub const INVITATION_TOKEN: &str = "invitations_token_key";
    pub const MEMBERSHIP: &str = "memberships_pkey";
    pub const TASK_TAG: &str = "task_tags_pkey";
}

/// Result of redeeming an invitation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Membership created and invitation flipped to ACCEPTED
    Accepted(Invitation),

    /// No invitation carries this token
    NotFound,

    /// Invitation exists but cannot be redeemed
    Rejected(InvitationRejection),

    /// The user already belongs to the invitation's organization
    AlreadyMember,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Creates a user and records `CREATED/USER` (actor = the new user,
    /// metadata `{email}`) in one unit
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with `NotFound` if the user does not exist
    async fn update_user(&self, id: i64, data: UpdateUser, audit: AuditEntry) -> StoreResult<User>;

    async fn list_user_emails(&self) -> StoreResult<Vec<String>>;

    // Refresh tokens

    /// Deletes every refresh token of `token.user_id` and stores `token`
    async fn replace_refresh_tokens(&self, token: NewRefreshToken) -> StoreResult<RefreshToken>;

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    // Organizations and memberships

    /// Creates the organization and an OWNER membership for `owner_id`
    ///
    /// Fails with `Conflict(organizations_slug_key)` if the slug is taken.
    async fn create_organization(
        &self,
        data: CreateOrganization,
        owner_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<Organization>;

    async fn find_organization_by_id(&self, id: i64) -> StoreResult<Option<Organization>>;

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>>;

    async fn list_organizations_for_user(&self, user_id: i64) -> StoreResult<Vec<Organization>>;

    async fn find_membership(
        &self,
        user_id: i64,
        organization_id: i64,
    ) -> StoreResult<Option<Membership>>;

    // Invitations

    async fn create_invitation(
        &self,
        data: CreateInvitation,
        audit: AuditEntry,
    ) -> StoreResult<Invitation>;

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>>;

    /// Redeems `token` for `user_id` at `now`
    ///
    /// On success the membership, the status flip and the audit row
    /// (with `organization_id` set to the invitation's organization) are
    /// written together. Every other outcome writes nothing.
    async fn accept_invitation(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
        audit: AuditEntry,
    ) -> StoreResult<AcceptOutcome>;

    async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    // Projects

    /// Creates a project together with its initial tasks
    async fn create_project(
        &self,
        data: CreateProject,
        tasks: Vec<NewTask>,
        audit: AuditEntry,
    ) -> StoreResult<(Project, Vec<Task>)>;

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>>;

    async fn update_project(
        &self,
        id: i64,
        data: UpdateProject,
        audit: AuditEntry,
    ) -> StoreResult<Project>;

    /// Deletes the project and everything below it
    async fn delete_project(&self, id: i64, audit: AuditEntry) -> StoreResult<()>;

    /// Up to `limit` projects of an organization with `id >= cursor`,
    /// ascending by id
    async fn list_projects(
        &self,
        organization_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> StoreResult<Vec<Project>>;

    async fn project_stats(&self) -> StoreResult<Vec<ProjectStats>>;

    // Tasks

    async fn create_task(&self, data: CreateTask, audit: AuditEntry) -> StoreResult<Task>;

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>>;

    async fn update_task(&self, id: i64, data: UpdateTask, audit: AuditEntry) -> StoreResult<Task>;

    async fn update_task_status(
        &self,
        id: i64,
        status: TaskStatus,
        audit: AuditEntry,
    ) -> StoreResult<Task>;

    async fn delete_task(&self, id: i64, audit: AuditEntry) -> StoreResult<()>;

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    // Comments

    async fn create_comment(&self, data: CreateComment, audit: AuditEntry) -> StoreResult<Comment>;

    async fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>>;

    async fn delete_comment(&self, id: i64, audit: AuditEntry) -> StoreResult<()>;

    // Tags

    async fn create_tag(&self, data: CreateTag, audit: AuditEntry) -> StoreResult<Tag>;

    async fn find_tag(&self, id: i64) -> StoreResult<Option<Tag>>;

    async fn list_tags(&self, organization_id: i64) -> StoreResult<Vec<Tag>>;

    /// Fails with `Conflict(task_tags_pkey)` if already attached
    async fn attach_tag(
        &self,
        task_id: i64,
        tag_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<TaskTag>;

    /// Returns false (and records nothing) if the tag was not attached
    async fn detach_tag(&self, task_id: i64, tag_id: i64, audit: AuditEntry) -> StoreResult<bool>;

    // Audit

    /// Entries matching `filter`, newest first, at most `limit`
    async fn list_audit_logs(&self, filter: &AuditFilter, limit: i64) -> StoreResult<Vec<AuditLog>>;

    // Health

    /// Round-trips to the backing store
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn test_store_is_object_safe() {
        fn assert_dyn(_: &dyn Store) {}
        assert_dyn(&MemoryStore::new());
    }
}
