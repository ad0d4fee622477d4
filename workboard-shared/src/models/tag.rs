/// Tag model and task attachments
///
/// Tags are scoped to an organization and attached to tasks through the
/// `task_tags` join table, keyed by `(task_id, tag_id)`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(50) NOT NULL,
///     organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_tags (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub organization_id: i64,
}

/// Attachment of a tag to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskTag {
    pub task_id: i64,
    pub tag_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub async fn create<'e, E>(executor: E, data: CreateTag) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, organization_id)
            VALUES ($1, $2)
            RETURNING id, name, organization_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.organization_id)
        .fetch_one(executor)
        .await?;

        Ok(tag)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, name, organization_id, created_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(tag)
    }

    pub async fn list_by_organization<'e, E>(
        executor: E,
        organization_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, organization_id, created_at
            FROM tags
            WHERE organization_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(tags)
    }
}

impl TaskTag {
    /// Attaches a tag to a task
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`task_tags_pkey`) if already attached.
    pub async fn attach<'e, E>(executor: E, task_id: i64, tag_id: i64) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task_tag = sqlx::query_as::<_, TaskTag>(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            VALUES ($1, $2)
            RETURNING task_id, tag_id, created_at
            "#,
        )
        .bind(task_id)
        .bind(tag_id)
        .fetch_one(executor)
        .await?;

        Ok(task_tag)
    }

    /// Removes an attachment, returning whether one existed
    pub async fn detach<'e, E>(executor: E, task_id: i64, tag_id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1 AND tag_id = $2")
            .bind(task_id)
            .bind(tag_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
