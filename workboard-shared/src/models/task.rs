/// Task model and database operations
///
/// Tasks belong to a project and move through a small status graph.
///
/// # State Machine
///
/// ```text
/// TODO → IN_PROGRESS → DONE
///             ↑          │
///             └──────────┘
/// ```
///
/// There is no terminal state: a DONE task can be reopened to IN_PROGRESS.
/// Every other transition (including TODO → DONE, DONE → TODO and any
/// self-transition) is rejected.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'DONE');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(2000),
///     status task_status NOT NULL DEFAULT 'TODO',
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assignee_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Statuses reachable from this one in a single step
    pub fn allowed_transitions(&self) -> &'static [TaskStatus] {
        match self {
            TaskStatus::Todo => &[TaskStatus::InProgress],
            TaskStatus::InProgress => &[TaskStatus::Done],
            TaskStatus::Done => &[TaskStatus::InProgress],
        }
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sortable task fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSort {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task created together with its project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
}

/// Partial task update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

/// Filters for listing the tasks of one project
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: i64,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<i64>,
    pub sort: TaskSort,
    pub order: SortOrder,
}

impl Task {
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, project_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, status, project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, project_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                assignee_id = COALESCE($4, assignee_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assignee_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    pub async fn update_status<'e, E>(
        executor: E,
        id: i64,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the tasks of a project matching `filter`
    pub async fn list<'e, E>(executor: E, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let order_by = match (filter.sort, filter.order) {
            (TaskSort::CreatedAt, SortOrder::Asc) => "created_at ASC, id ASC",
            (TaskSort::CreatedAt, SortOrder::Desc) => "created_at DESC, id DESC",
        };

        let query = format!(
            r#"
            SELECT id, title, description, status, project_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::BIGINT IS NULL OR assignee_id = $3)
            ORDER BY {}
            "#,
            order_by
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(filter.project_id)
            .bind(filter.status)
            .bind(filter.assignee_id)
            .fetch_all(executor)
            .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use TaskStatus::*;

        let cases = [
            (Todo, Todo, false),
            (Todo, InProgress, true),
            (Todo, Done, false),
            (InProgress, Todo, false),
            (InProgress, InProgress, false),
            (InProgress, Done, true),
            (Done, Todo, false),
            (Done, InProgress, true),
            (Done, Done, false),
        ];

        for (from, to, expected) in cases {
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "{} -> {} should be {}",
                from,
                to,
                if expected { "allowed" } else { "rejected" }
            );
        }
    }

    #[test]
    fn test_every_status_has_an_exit() {
        for status in TaskStatus::ALL {
            assert!(!status.allowed_transitions().is_empty());
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        let status: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_sort_defaults() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!(TaskSort::default(), TaskSort::CreatedAt);

        let order: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order, SortOrder::Asc);
        let sort: TaskSort = serde_json::from_str("\"createdAt\"").unwrap();
        assert_eq!(sort, TaskSort::CreatedAt);
    }
}
