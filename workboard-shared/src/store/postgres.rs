/// PostgreSQL implementation of [`Store`]
///
/// Reads go straight to the pool. Every mutation opens a transaction, runs
/// the model queries plus [`AuditLog::insert`] on it, and commits; any error
/// drops the transaction, which rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::debug;

use super::{AcceptOutcome, Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::audit_log::{
    AuditAction, AuditEntityType, AuditEntry, AuditFilter, AuditLog,
};
use crate::models::comment::{Comment, CreateComment};
use crate::models::invitation::{CreateInvitation, Invitation};
use crate::models::membership::{CreateMembership, Membership, MembershipRole};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectStats, UpdateProject};
use crate::models::refresh_token::{NewRefreshToken, RefreshToken};
use crate::models::tag::{CreateTag, Tag, TaskTag};
use crate::models::task::{CreateTask, NewTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = User::create(&mut *tx, data).await?;
        let audit = AuditEntry::new(user.id, AuditAction::Created, AuditEntityType::User)
            .with_metadata(json!({ "email": user.email }));
        AuditLog::insert(&mut *tx, &audit, user.id).await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: i64, data: UpdateUser, audit: AuditEntry) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = User::update(&mut *tx, id, data)
            .await?
            .ok_or(StoreError::NotFound)?;
        AuditLog::insert(&mut *tx, &audit, user.id).await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn list_user_emails(&self) -> StoreResult<Vec<String>> {
        Ok(User::list_emails(&self.pool).await?)
    }

    async fn replace_refresh_tokens(&self, token: NewRefreshToken) -> StoreResult<RefreshToken> {
        let mut tx = self.pool.begin().await?;

        let removed = RefreshToken::delete_for_user(&mut *tx, token.user_id).await?;
        let stored = RefreshToken::create(&mut *tx, token).await?;

        tx.commit().await?;
        debug!(user_id = stored.user_id, superseded = removed, "Stored refresh token");
        Ok(stored)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(RefreshToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(RefreshToken::delete_expired(&self.pool, now).await?)
    }

    async fn create_organization(
        &self,
        data: CreateOrganization,
        owner_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<Organization> {
        let mut tx = self.pool.begin().await?;

        let organization = Organization::create(&mut *tx, data).await?;
        Membership::create(
            &mut *tx,
            CreateMembership {
                user_id: owner_id,
                organization_id: organization.id,
                role: MembershipRole::Owner,
            },
        )
        .await?;
        let audit = audit.in_organization(organization.id);
        AuditLog::insert(&mut *tx, &audit, organization.id).await?;

        tx.commit().await?;
        Ok(organization)
    }

    async fn find_organization_by_id(&self, id: i64) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_id(&self.pool, id).await?)
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_slug(&self.pool, slug).await?)
    }

    async fn list_organizations_for_user(&self, user_id: i64) -> StoreResult<Vec<Organization>> {
        Ok(Organization::list_for_user(&self.pool, user_id).await?)
    }

    async fn find_membership(
        &self,
        user_id: i64,
        organization_id: i64,
    ) -> StoreResult<Option<Membership>> {
        Ok(Membership::find(&self.pool, user_id, organization_id).await?)
    }

    async fn create_invitation(
        &self,
        data: CreateInvitation,
        audit: AuditEntry,
    ) -> StoreResult<Invitation> {
        let mut tx = self.pool.begin().await?;

        let invitation = Invitation::create(&mut *tx, data).await?;
        AuditLog::insert(&mut *tx, &audit, invitation.id).await?;

        tx.commit().await?;
        Ok(invitation)
    }

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_token(&self.pool, token).await?)
    }

    async fn accept_invitation(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
        audit: AuditEntry,
    ) -> StoreResult<AcceptOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(invitation) = Invitation::find_by_token_for_update(&mut *tx, token).await? else {
            return Ok(AcceptOutcome::NotFound);
        };

        if let Err(rejection) = invitation.check_acceptable(now) {
            return Ok(AcceptOutcome::Rejected(rejection));
        }

        if Membership::find(&mut *tx, user_id, invitation.organization_id)
            .await?
            .is_some()
        {
            return Ok(AcceptOutcome::AlreadyMember);
        }

        Membership::create(
            &mut *tx,
            CreateMembership {
                user_id,
                organization_id: invitation.organization_id,
                role: invitation.role,
            },
        )
        .await?;

        let accepted = Invitation::mark_accepted(&mut *tx, invitation.id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let audit = audit.in_organization(invitation.organization_id);
        AuditLog::insert(&mut *tx, &audit, invitation.id).await?;

        tx.commit().await?;
        Ok(AcceptOutcome::Accepted(accepted))
    }

    async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Invitation::delete_expired(&self.pool, now).await?)
    }

    async fn create_project(
        &self,
        data: CreateProject,
        tasks: Vec<NewTask>,
        audit: AuditEntry,
    ) -> StoreResult<(Project, Vec<Task>)> {
        let mut tx = self.pool.begin().await?;

        let project = Project::create(&mut *tx, data).await?;

        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            let task = Task::create(
                &mut *tx,
                CreateTask {
                    title: task.title,
                    description: task.description,
                    project_id: project.id,
                },
            )
            .await?;
            created.push(task);
        }

        AuditLog::insert(&mut *tx, &audit, project.id).await?;

        tx.commit().await?;
        Ok((project, created))
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn update_project(
        &self,
        id: i64,
        data: UpdateProject,
        audit: AuditEntry,
    ) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;

        let project = Project::update(&mut *tx, id, data)
            .await?
            .ok_or(StoreError::NotFound)?;
        AuditLog::insert(&mut *tx, &audit, project.id).await?;

        tx.commit().await?;
        Ok(project)
    }

    async fn delete_project(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Project::delete(&mut *tx, id).await? {
            return Err(StoreError::NotFound);
        }
        AuditLog::insert(&mut *tx, &audit, id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_projects(
        &self,
        organization_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> StoreResult<Vec<Project>> {
        Ok(Project::list_page(&self.pool, organization_id, cursor, limit).await?)
    }

    async fn project_stats(&self) -> StoreResult<Vec<ProjectStats>> {
        Ok(Project::status_counts(&self.pool).await?)
    }

    async fn create_task(&self, data: CreateTask, audit: AuditEntry) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        let task = Task::create(&mut *tx, data).await?;
        AuditLog::insert(&mut *tx, &audit, task.id).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn update_task(&self, id: i64, data: UpdateTask, audit: AuditEntry) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        let task = Task::update(&mut *tx, id, data)
            .await?
            .ok_or(StoreError::NotFound)?;
        AuditLog::insert(&mut *tx, &audit, task.id).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn update_task_status(
        &self,
        id: i64,
        status: TaskStatus,
        audit: AuditEntry,
    ) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        let task = Task::update_status(&mut *tx, id, status)
            .await?
            .ok_or(StoreError::NotFound)?;
        AuditLog::insert(&mut *tx, &audit, task.id).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn delete_task(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Task::delete(&mut *tx, id).await? {
            return Err(StoreError::NotFound);
        }
        AuditLog::insert(&mut *tx, &audit, id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    async fn create_comment(&self, data: CreateComment, audit: AuditEntry) -> StoreResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let comment = Comment::create(&mut *tx, data).await?;
        AuditLog::insert(&mut *tx, &audit, comment.id).await?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_by_id(&self.pool, id).await?)
    }

    async fn delete_comment(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Comment::delete(&mut *tx, id).await? {
            return Err(StoreError::NotFound);
        }
        AuditLog::insert(&mut *tx, &audit, id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_tag(&self, data: CreateTag, audit: AuditEntry) -> StoreResult<Tag> {
        let mut tx = self.pool.begin().await?;

        let tag = Tag::create(&mut *tx, data).await?;
        AuditLog::insert(&mut *tx, &audit, tag.id).await?;

        tx.commit().await?;
        Ok(tag)
    }

    async fn find_tag(&self, id: i64) -> StoreResult<Option<Tag>> {
        Ok(Tag::find_by_id(&self.pool, id).await?)
    }

    async fn list_tags(&self, organization_id: i64) -> StoreResult<Vec<Tag>> {
        Ok(Tag::list_by_organization(&self.pool, organization_id).await?)
    }

    async fn attach_tag(
        &self,
        task_id: i64,
        tag_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<TaskTag> {
        let mut tx = self.pool.begin().await?;

        let task_tag = TaskTag::attach(&mut *tx, task_id, tag_id).await?;
        AuditLog::insert(&mut *tx, &audit, tag_id).await?;

        tx.commit().await?;
        Ok(task_tag)
    }

    async fn detach_tag(&self, task_id: i64, tag_id: i64, audit: AuditEntry) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        if !TaskTag::detach(&mut *tx, task_id, tag_id).await? {
            return Ok(false);
        }
        AuditLog::insert(&mut *tx, &audit, tag_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        limit: i64,
    ) -> StoreResult<Vec<AuditLog>> {
        Ok(AuditLog::list(&self.pool, filter, limit).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
