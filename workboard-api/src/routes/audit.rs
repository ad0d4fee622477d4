/// Audit log endpoint
///
/// ```text
/// GET /api/v1/audit?organizationId&entityType&action&from&to
/// ```
///
/// With `organizationId` the caller must belong to that organization and
/// sees all of its entries; without it only the caller's own entries are
/// returned. Newest first, at most 50. `from`/`to` are RFC 3339 timestamps.

use crate::{app::AppState, error::ApiResult, extract::ValidQuery};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::audit_log::{AuditAction, AuditEntityType, AuditFilter, AuditLog};
use workboard_shared::services::audit;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub organization_id: Option<i64>,
    pub entity_type: Option<AuditEntityType>,
    pub action: Option<AuditAction>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidQuery(query): ValidQuery<AuditQuery>,
) -> ApiResult<Json<Vec<AuditLog>>> {
    let filter = AuditFilter {
        organization_id: query.organization_id,
        user_id: None,
        entity_type: query.entity_type,
        action: query.action,
        from: query.from,
        to: query.to,
    };

    Ok(Json(audit::list_audit_logs(state.store(), auth.user_id, filter).await?))
}
