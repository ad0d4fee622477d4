/// Organization model and database operations
///
/// Organizations are the tenancy boundary: projects, tags and invitations
/// belong to exactly one organization, and users reach them through a
/// membership.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     slug VARCHAR(120) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Slugs
///
/// The slug is derived from the name with [`slugify`]. Collisions are
/// resolved by the service layer with a numeric suffix (`acme`, `acme-1`,
/// `acme-2`, ...).

use chrono::{DateTime, Utc};
use deunicode::deunicode;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Slug used when a name has no usable characters
pub const FALLBACK_SLUG: &str = "organization";

/// Organization (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i64,

    /// Display name
    pub name: String,

    /// URL-safe unique identifier
    pub slug: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
}

/// Derives a lowercase, dash-separated slug from a display name
///
/// Non-ASCII text is transliterated first (`é` becomes `e`, `ß` becomes
/// `ss`). ASCII letters and digits are kept, whitespace, `-` and `_` become a
/// single dash, and everything else is dropped.
///
/// # Example
///
/// ```
/// use workboard_shared::models::organization::slugify;
///
/// assert_eq!(slugify("My Org"), "my-org");
/// assert_eq!(slugify("  Acme & Co.  "), "acme-co");
/// assert_eq!(slugify("Café Society"), "cafe-society");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in deunicode(name).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Returns the `attempt`-th candidate slug for a base slug
///
/// Attempt 0 is the base itself, attempt `n` appends `-n`.
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

impl Organization {
    /// Inserts an organization
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`organizations_slug_key`) when the slug
    /// is taken.
    pub async fn create<'e, E>(executor: E, data: CreateOrganization) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(executor)
        .await?;

        Ok(organization)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(organization)
    }

    pub async fn find_by_slug<'e, E>(executor: E, slug: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(executor)
        .await?;

        Ok(organization)
    }

    /// Lists the organizations a user is a member of, in creation order
    pub async fn list_for_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.slug, o.created_at
            FROM organizations o
            JOIN memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(organizations)
    }
}
