/// Membership model and database operations
///
/// A membership is the join row granting a user a role inside one
/// organization. Rows are keyed by `(user_id, organization_id)` and are never
/// updated in place.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('OWNER', 'ADMIN', 'MEMBER');
///
/// CREATE TABLE memberships (
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     organization_id BIGINT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'MEMBER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, organization_id)
/// );
/// ```
///
/// # Roles
///
/// - **OWNER**: creator of the organization
/// - **ADMIN**: same privileges as OWNER for every gated action
/// - **MEMBER**: can read, create and update, but not delete or invite
///
/// There is no numeric hierarchy. Gated actions list the roles they accept,
/// see [`crate::auth::authorization::ELEVATED_ROLES`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Role of a user within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipRole {
    Owner,
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "OWNER",
            MembershipRole::Admin => "ADMIN",
            MembershipRole::Member => "MEMBER",
        }
    }
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership of a user in an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: i64,

    pub organization_id: i64,

    pub role: MembershipRole,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub user_id: i64,
    pub organization_id: i64,
    pub role: MembershipRole,
}

impl Membership {
    /// Adds a user to an organization
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`memberships_pkey`) if the user is
    /// already a member.
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            RETURNING user_id, organization_id, role, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.organization_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Looks up the membership of a user in an organization
    pub async fn find<'e, E>(
        executor: E,
        user_id: i64,
        organization_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_id, organization_id, role, created_at
            FROM memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }
}
