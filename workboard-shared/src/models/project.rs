/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(1000),
///     organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a project cascades to its tasks, their comments and their tag
/// attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: i64,
}

/// Partial project update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Task counts per status for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub project_id: i64,
    pub name: String,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
}

impl ProjectStats {
    pub fn new(project_id: i64, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds `count` tasks of `status`
    pub fn add(&mut self, status: TaskStatus, count: i64) {
        match status {
            TaskStatus::Todo => self.todo += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Done => self.done += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.todo + self.in_progress + self.done
    }
}

impl Project {
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, organization_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, organization_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.organization_id)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, organization_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, organization_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Deletes a project, returning whether a row was removed
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Keyset page of an organization's projects
    ///
    /// Returns up to `limit` projects with `id >= cursor` (or from the start
    /// when `cursor` is `None`), ordered by id ascending.
    pub async fn list_page<'e, E>(
        executor: E,
        organization_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, organization_id, created_at, updated_at
            FROM projects
            WHERE organization_id = $1
              AND ($2::BIGINT IS NULL OR id >= $2)
            ORDER BY id ASC
            LIMIT $3
            "#,
        )
        .bind(organization_id)
        .bind(cursor)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Task counts per status for every project, ordered by project id
    ///
    /// Projects without tasks are included with zero counts.
    pub async fn status_counts<'e, E>(executor: E) -> Result<Vec<ProjectStats>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, (i64, String, Option<TaskStatus>, i64)>(
            r#"
            SELECT p.id, p.name, t.status, COUNT(t.id)
            FROM projects p
            LEFT JOIN tasks t ON t.project_id = p.id
            GROUP BY p.id, p.name, t.status
            ORDER BY p.id ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        let mut stats: Vec<ProjectStats> = Vec::new();
        for (project_id, name, status, count) in rows {
            if stats.last().map(|s| s.project_id) != Some(project_id) {
                stats.push(ProjectStats::new(project_id, name));
            }
            if let (Some(status), Some(entry)) = (status, stats.last_mut()) {
                entry.add(status, count);
            }
        }

        Ok(stats)
    }
}
