/// Invitation model and database operations
///
/// An invitation grants membership (with a chosen role) to whoever redeems
/// its token. Tokens are 32 random bytes, hex encoded, single use and valid
/// for [`INVITATION_TTL_DAYS`] days.
///
/// # Lifecycle
///
/// ```text
/// PENDING → ACCEPTED   (exactly once)
/// PENDING → expired    (expires_at passed, removed by the maintenance job)
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::membership::MembershipRole;

/// Days an invitation stays redeemable
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Random bytes per token (hex encoding doubles the length)
pub const TOKEN_BYTES: usize = 32;

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

/// Invitation to join an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,

    /// Invitee email
    pub email: String,

    /// Role granted on acceptance
    pub role: MembershipRole,

    pub organization_id: i64,

    /// 64 lowercase hex characters
    pub token: String,

    pub status: InvitationStatus,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub email: String,
    pub role: MembershipRole,
    pub organization_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Why an invitation cannot be redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationRejection {
    /// Status is no longer PENDING
    AlreadyUsed,

    /// `expires_at` is in the past
    Expired,
}

/// Generates a fresh invitation token
///
/// # Example
///
/// ```
/// use workboard_shared::models::invitation::generate_token;
///
/// let token = generate_token();
/// assert_eq!(token.len(), 64);
/// ```
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Expiry for an invitation issued at `now`
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(INVITATION_TTL_DAYS)
}

impl Invitation {
    /// Checks whether this invitation may be redeemed at `now`
    ///
    /// Status is checked before expiry, so a used invitation reports
    /// `AlreadyUsed` even after it has expired.
    pub fn check_acceptable(&self, now: DateTime<Utc>) -> Result<(), InvitationRejection> {
        if self.status != InvitationStatus::Pending {
            return Err(InvitationRejection::AlreadyUsed);
        }

        if self.expires_at < now {
            return Err(InvitationRejection::Expired);
        }

        Ok(())
    }

    pub async fn create<'e, E>(executor: E, data: CreateInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (email, role, organization_id, token, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, role, organization_id, token, status, expires_at, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.role)
        .bind(data.organization_id)
        .bind(data.token)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await?;

        Ok(invitation)
    }

    pub async fn find_by_token<'e, E>(executor: E, token: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, role, organization_id, token, status, expires_at, created_at
            FROM invitations
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Same as [`Invitation::find_by_token`] but locks the row until the
    /// surrounding transaction ends
    pub async fn find_by_token_for_update<'e, E>(
        executor: E,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, role, organization_id, token, status, expires_at, created_at
            FROM invitations
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Flips a pending invitation to ACCEPTED
    pub async fn mark_accepted<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = 'ACCEPTED'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING id, email, role, organization_id, token, status, expires_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Deletes invitations that expired before `now`
    pub async fn delete_expired<'e, E>(executor: E, now: DateTime<Utc>) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM invitations WHERE expires_at < $1")
            .bind(now)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
