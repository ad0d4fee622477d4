/// In-memory implementation of [`Store`]
///
/// Holds every table in ordinary collections behind one async mutex, so each
/// method observes and mutates a consistent snapshot. Unique constraints and
/// cascades mirror the SQL schema closely enough for service and HTTP tests
/// to run without a database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Mutex;

use super::{constraints, AcceptOutcome, Store, StoreError, StoreResult};
use crate::models::audit_log::{
    AuditAction, AuditEntityType, AuditEntry, AuditFilter, AuditLog,
};
use crate::models::comment::{Comment, CreateComment};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use crate::models::membership::{Membership, MembershipRole};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectStats, UpdateProject};
use crate::models::refresh_token::{NewRefreshToken, RefreshToken};
use crate::models::tag::{CreateTag, Tag, TaskTag};
use crate::models::task::{
    CreateTask, NewTask, SortOrder, Task, TaskFilter, TaskStatus, UpdateTask,
};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Per-table id sequences, like BIGSERIAL
#[derive(Debug, Default)]
struct Sequences {
    users: i64,
    organizations: i64,
    invitations: i64,
    projects: i64,
    tasks: i64,
    comments: i64,
    tags: i64,
    audit_logs: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct MemoryState {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    organizations: BTreeMap<i64, Organization>,
    memberships: HashMap<(i64, i64), Membership>,
    invitations: BTreeMap<i64, Invitation>,
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    comments: BTreeMap<i64, Comment>,
    tags: BTreeMap<i64, Tag>,
    task_tags: BTreeMap<(i64, i64), TaskTag>,
    audit_logs: Vec<AuditLog>,
}

impl MemoryState {
    fn record(&mut self, entry: AuditEntry, entity_id: i64) -> AuditLog {
        let log = AuditLog {
            id: next(&mut self.seq.audit_logs),
            user_id: entry.user_id,
            organization_id: entry.organization_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        self.audit_logs.push(log.clone());
        log
    }

    fn insert_task(&mut self, data: CreateTask) -> StoreResult<Task> {
        if !self.projects.contains_key(&data.project_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let task = Task {
            id: next(&mut self.seq.tasks),
            title: data.title,
            description: data.description,
            status: TaskStatus::Todo,
            project_id: data.project_id,
            assignee_id: None,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    /// Removes a task with its comments and tag attachments
    fn remove_task(&mut self, task_id: i64) -> bool {
        if self.tasks.remove(&task_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.task_id != task_id);
        self.task_tags.retain(|(t, _), _| *t != task_id);
        true
    }
}

/// Store keeping all data in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(constraints::USER_EMAIL.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: next(&mut state.seq.users),
            email: data.email,
            password_hash: data.password_hash,
            name: data.name,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        let audit = AuditEntry::new(user.id, AuditAction::Created, AuditEntityType::User)
            .with_metadata(json!({ "email": user.email }));
        state.record(audit, user.id);

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, data: UpdateUser, audit: AuditEntry) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(ref email) = data.email {
            if state.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict(constraints::USER_EMAIL.to_string()));
            }
        }

        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(name) = data.name {
            user.name = Some(name);
        }
        user.updated_at = Utc::now();
        let user = user.clone();

        state.record(audit, id);
        Ok(user)
    }

    async fn list_user_emails(&self) -> StoreResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state.users.values().map(|u| u.email.clone()).collect())
    }

    async fn replace_refresh_tokens(&self, token: NewRefreshToken) -> StoreResult<RefreshToken> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&token.user_id) {
            return Err(StoreError::NotFound);
        }

        state.refresh_tokens.retain(|_, t| t.user_id != token.user_id);
        let stored = RefreshToken {
            token_hash: token.token_hash,
            user_id: token.user_id,
            expires_at: token.expires_at,
            created_at: Utc::now(),
        };
        state
            .refresh_tokens
            .insert(stored.token_hash.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(self.state.lock().await.refresh_tokens.get(token_hash).cloned())
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - state.refresh_tokens.len()) as u64)
    }

    async fn create_organization(
        &self,
        data: CreateOrganization,
        owner_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<Organization> {
        let mut state = self.state.lock().await;

        if state.organizations.values().any(|o| o.slug == data.slug) {
            return Err(StoreError::Conflict(constraints::ORGANIZATION_SLUG.to_string()));
        }
        if !state.users.contains_key(&owner_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let organization = Organization {
            id: next(&mut state.seq.organizations),
            name: data.name,
            slug: data.slug,
            created_at: now,
        };
        state
            .organizations
            .insert(organization.id, organization.clone());
        state.memberships.insert(
            (owner_id, organization.id),
            Membership {
                user_id: owner_id,
                organization_id: organization.id,
                role: MembershipRole::Owner,
                created_at: now,
            },
        );
        state.record(audit.in_organization(organization.id), organization.id);

        Ok(organization)
    }

    async fn find_organization_by_id(&self, id: i64) -> StoreResult<Option<Organization>> {
        Ok(self.state.lock().await.organizations.get(&id).cloned())
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        let state = self.state.lock().await;
        Ok(state.organizations.values().find(|o| o.slug == slug).cloned())
    }

    async fn list_organizations_for_user(&self, user_id: i64) -> StoreResult<Vec<Organization>> {
        let state = self.state.lock().await;
        Ok(state
            .organizations
            .values()
            .filter(|o| state.memberships.contains_key(&(user_id, o.id)))
            .cloned()
            .collect())
    }

    async fn find_membership(
        &self,
        user_id: i64,
        organization_id: i64,
    ) -> StoreResult<Option<Membership>> {
        let state = self.state.lock().await;
        Ok(state.memberships.get(&(user_id, organization_id)).cloned())
    }

    async fn create_invitation(
        &self,
        data: CreateInvitation,
        audit: AuditEntry,
    ) -> StoreResult<Invitation> {
        let mut state = self.state.lock().await;

        if state.invitations.values().any(|i| i.token == data.token) {
            return Err(StoreError::Conflict(constraints::INVITATION_TOKEN.to_string()));
        }
        if !state.organizations.contains_key(&data.organization_id) {
            return Err(StoreError::NotFound);
        }

        let invitation = Invitation {
            id: next(&mut state.seq.invitations),
            email: data.email,
            role: data.role,
            organization_id: data.organization_id,
            token: data.token,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        };
        state.invitations.insert(invitation.id, invitation.clone());
        state.record(audit, invitation.id);

        Ok(invitation)
    }

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state.invitations.values().find(|i| i.token == token).cloned())
    }

    async fn accept_invitation(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
        audit: AuditEntry,
    ) -> StoreResult<AcceptOutcome> {
        let mut state = self.state.lock().await;

        let Some(invitation) = state.invitations.values().find(|i| i.token == token).cloned() else {
            return Ok(AcceptOutcome::NotFound);
        };

        if let Err(rejection) = invitation.check_acceptable(now) {
            return Ok(AcceptOutcome::Rejected(rejection));
        }

        let key = (user_id, invitation.organization_id);
        if state.memberships.contains_key(&key) {
            return Ok(AcceptOutcome::AlreadyMember);
        }

        state.memberships.insert(
            key,
            Membership {
                user_id,
                organization_id: invitation.organization_id,
                role: invitation.role,
                created_at: Utc::now(),
            },
        );

        let accepted = state
            .invitations
            .get_mut(&invitation.id)
            .map(|i| {
                i.status = InvitationStatus::Accepted;
                i.clone()
            })
            .ok_or(StoreError::NotFound)?;

        state.record(audit.in_organization(invitation.organization_id), invitation.id);

        Ok(AcceptOutcome::Accepted(accepted))
    }

    async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.invitations.len();
        state.invitations.retain(|_, i| i.expires_at >= now);
        Ok((before - state.invitations.len()) as u64)
    }

    async fn create_project(
        &self,
        data: CreateProject,
        tasks: Vec<NewTask>,
        audit: AuditEntry,
    ) -> StoreResult<(Project, Vec<Task>)> {
        let mut state = self.state.lock().await;

        if !state.organizations.contains_key(&data.organization_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let project = Project {
            id: next(&mut state.seq.projects),
            name: data.name,
            description: data.description,
            organization_id: data.organization_id,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());

        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            created.push(state.insert_task(CreateTask {
                title: task.title,
                description: task.description,
                project_id: project.id,
            })?);
        }

        state.record(audit, project.id);
        Ok((project, created))
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(self.state.lock().await.projects.get(&id).cloned())
    }

    async fn update_project(
        &self,
        id: i64,
        data: UpdateProject,
        audit: AuditEntry,
    ) -> StoreResult<Project> {
        let mut state = self.state.lock().await;

        let project = state.projects.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = Some(description);
        }
        project.updated_at = Utc::now();
        let project = project.clone();

        state.record(audit, id);
        Ok(project)
    }

    async fn delete_project(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if state.projects.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        let task_ids: Vec<i64> = state
            .tasks
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            state.remove_task(task_id);
        }

        state.record(audit, id);
        Ok(())
    }

    async fn list_projects(
        &self,
        organization_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> StoreResult<Vec<Project>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(state
            .projects
            .values()
            .filter(|p| p.organization_id == organization_id)
            .filter(|p| cursor.map_or(true, |c| p.id >= c))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn project_stats(&self) -> StoreResult<Vec<ProjectStats>> {
        let state = self.state.lock().await;

        Ok(state
            .projects
            .values()
            .map(|p| {
                let mut stats = ProjectStats::new(p.id, p.name.clone());
                for task in state.tasks.values().filter(|t| t.project_id == p.id) {
                    stats.add(task.status, 1);
                }
                stats
            })
            .collect())
    }

    async fn create_task(&self, data: CreateTask, audit: AuditEntry) -> StoreResult<Task> {
        let mut state = self.state.lock().await;

        let task = state.insert_task(data)?;
        state.record(audit, task.id);
        Ok(task)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.state.lock().await.tasks.get(&id).cloned())
    }

    async fn update_task(&self, id: i64, data: UpdateTask, audit: AuditEntry) -> StoreResult<Task> {
        let mut state = self.state.lock().await;

        if let Some(assignee_id) = data.assignee_id {
            if !state.users.contains_key(&assignee_id) {
                return Err(StoreError::NotFound);
            }
        }

        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = Some(description);
        }
        if let Some(assignee_id) = data.assignee_id {
            task.assignee_id = Some(assignee_id);
        }
        task.updated_at = Utc::now();
        let task = task.clone();

        state.record(audit, id);
        Ok(task)
    }

    async fn update_task_status(
        &self,
        id: i64,
        status: TaskStatus,
        audit: AuditEntry,
    ) -> StoreResult<Task> {
        let mut state = self.state.lock().await;

        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        task.status = status;
        task.updated_at = Utc::now();
        let task = task.clone();

        state.record(audit, id);
        Ok(task)
    }

    async fn delete_task(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if !state.remove_task(id) {
            return Err(StoreError::NotFound);
        }

        state.record(audit, id);
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;

        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.project_id == filter.project_id)
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.assignee_id.map_or(true, |a| t.assignee_id == Some(a)))
            .cloned()
            .collect();

        tasks.sort_by_key(|t| (t.created_at, t.id));
        if filter.order == SortOrder::Desc {
            tasks.reverse();
        }

        Ok(tasks)
    }

    async fn create_comment(&self, data: CreateComment, audit: AuditEntry) -> StoreResult<Comment> {
        let mut state = self.state.lock().await;

        if !state.tasks.contains_key(&data.task_id) || !state.users.contains_key(&data.author_id) {
            return Err(StoreError::NotFound);
        }

        let comment = Comment {
            id: next(&mut state.seq.comments),
            content: data.content,
            task_id: data.task_id,
            author_id: data.author_id,
            created_at: Utc::now(),
        };
        state.comments.insert(comment.id, comment.clone());
        state.record(audit, comment.id);

        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        Ok(self.state.lock().await.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: i64, audit: AuditEntry) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if state.comments.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        state.record(audit, id);
        Ok(())
    }

    async fn create_tag(&self, data: CreateTag, audit: AuditEntry) -> StoreResult<Tag> {
        let mut state = self.state.lock().await;

        if !state.organizations.contains_key(&data.organization_id) {
            return Err(StoreError::NotFound);
        }

        let tag = Tag {
            id: next(&mut state.seq.tags),
            name: data.name,
            organization_id: data.organization_id,
            created_at: Utc::now(),
        };
        state.tags.insert(tag.id, tag.clone());
        state.record(audit, tag.id);

        Ok(tag)
    }

    async fn find_tag(&self, id: i64) -> StoreResult<Option<Tag>> {
        Ok(self.state.lock().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self, organization_id: i64) -> StoreResult<Vec<Tag>> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .values()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn attach_tag(
        &self,
        task_id: i64,
        tag_id: i64,
        audit: AuditEntry,
    ) -> StoreResult<TaskTag> {
        let mut state = self.state.lock().await;

        if !state.tasks.contains_key(&task_id) || !state.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound);
        }
        if state.task_tags.contains_key(&(task_id, tag_id)) {
            return Err(StoreError::Conflict(constraints::TASK_TAG.to_string()));
        }

        let task_tag = TaskTag {
            task_id,
            tag_id,
            created_at: Utc::now(),
        };
        state.task_tags.insert((task_id, tag_id), task_tag.clone());
        state.record(audit, tag_id);

        Ok(task_tag)
    }

    async fn detach_tag(&self, task_id: i64, tag_id: i64, audit: AuditEntry) -> StoreResult<bool> {
        let mut state = self.state.lock().await;

        if state.task_tags.remove(&(task_id, tag_id)).is_none() {
            return Ok(false);
        }

        state.record(audit, tag_id);
        Ok(true)
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        limit: i64,
    ) -> StoreResult<Vec<AuditLog>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        let mut logs: Vec<AuditLog> = state
            .audit_logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect();
        logs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        logs.truncate(limit);

        Ok(logs)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
