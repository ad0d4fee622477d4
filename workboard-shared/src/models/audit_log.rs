/// Audit log model
///
/// Append-only trail of state-changing actions. Rows are inserted in the same
/// transaction as the mutation they describe and are never updated or
/// deleted. `entity_id` identifies the affected row by value, so entries
/// outlive the entities they mention.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL,
///     organization_id BIGINT,
///     action audit_action NOT NULL,
///     entity_type audit_entity_type NOT NULL,
///     entity_id BIGINT NOT NULL,
///     metadata JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;

/// Maximum number of entries returned by a listing
pub const AUDIT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    MemberInvited,
    MemberJoined,
    Attached,
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_entity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntityType {
    User,
    Organization,
    Project,
    Task,
    Comment,
    Tag,
}

/// Stored audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,

    /// Acting user
    pub user_id: i64,

    /// Organization the action happened in, if any
    pub organization_id: Option<i64>,

    pub action: AuditAction,

    pub entity_type: AuditEntityType,

    pub entity_id: i64,

    pub metadata: JsonValue,

    pub created_at: DateTime<Utc>,
}

/// Audit record handed to a mutating store call
///
/// The store fills in `entity_id` with the row the mutation touched.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: i64,
    pub organization_id: Option<i64>,
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    pub metadata: JsonValue,
}

impl AuditEntry {
    pub fn new(user_id: i64, action: AuditAction, entity_type: AuditEntityType) -> Self {
        Self {
            user_id,
            organization_id: None,
            action,
            entity_type,
            metadata: JsonValue::Object(Default::default()),
        }
    }

    pub fn in_organization(mut self, organization_id: i64) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Filters for listing audit entries
///
/// Every `Some` field narrows the result. `from` and `to` are inclusive.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub organization_id: Option<i64>,
    pub user_id: Option<i64>,
    pub entity_type: Option<AuditEntityType>,
    pub action: Option<AuditAction>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Returns true if `log` passes every filter
    pub fn matches(&self, log: &AuditLog) -> bool {
        self.organization_id.map_or(true, |id| log.organization_id == Some(id))
            && self.user_id.map_or(true, |id| log.user_id == id)
            && self.entity_type.map_or(true, |t| log.entity_type == t)
            && self.action.map_or(true, |a| log.action == a)
            && self.from.map_or(true, |from| log.created_at >= from)
            && self.to.map_or(true, |to| log.created_at <= to)
    }
}

impl AuditLog {
    /// Appends an entry for `entity_id`
    pub async fn insert<'e, E>(
        executor: E,
        entry: &AuditEntry,
        entity_id: i64,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, organization_id, action, entity_type, entity_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, organization_id, action, entity_type, entity_id, metadata, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.organization_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entity_id)
        .bind(&entry.metadata)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    /// Lists entries matching `filter`, newest first, at most `limit`
    pub async fn list<'e, E>(
        executor: E,
        filter: &AuditFilter,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, organization_id, action, entity_type, entity_id, metadata, created_at
            FROM audit_logs
            WHERE ($1::BIGINT IS NULL OR organization_id = $1)
              AND ($2::BIGINT IS NULL OR user_id = $2)
              AND ($3::audit_entity_type IS NULL OR entity_type = $3)
              AND ($4::audit_action IS NULL OR action = $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR created_at <= $6)
            ORDER BY created_at DESC, id DESC
            LIMIT $7
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.user_id)
        .bind(filter.entity_type)
        .bind(filter.action)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }
}
