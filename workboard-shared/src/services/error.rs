use crate::auth::authorization::AuthzError;
use crate::models::task::TaskStatus;
use crate::store::StoreError;

/// Entities that can be reported missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Organization,
    Invitation,
    Project,
    Task,
    Comment,
    Tag,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::User => "User",
            Resource::Organization => "Organization",
            Resource::Invitation => "Invitation",
            Resource::Project => "Project",
            Resource::Task => "Task",
            Resource::Comment => "Comment",
            Resource::Tag => "Tag",
        }
    }

    pub fn not_found_code(&self) -> &'static str {
        match self {
            Resource::User => "USER_NOT_FOUND",
            Resource::Organization => "ORGANIZATION_NOT_FOUND",
            Resource::Invitation => "INVITATION_NOT_FOUND",
            Resource::Project => "PROJECT_NOT_FOUND",
            Resource::Task => "TASK_NOT_FOUND",
            Resource::Comment => "COMMENT_NOT_FOUND",
            Resource::Tag => "TAG_NOT_FOUND",
        }
    }
}

/// Failure of a use case, carrying a stable machine-readable code
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidToken,

    #[error("You do not have access to this organization")]
    AccessDenied,

    #[error("{0}")]
    Forbidden(String),

    #[error("{} not found", .0.name())]
    NotFound(Resource),

    #[error("Tag is not attached to this task")]
    TagNotAttached,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: TaskStatus, to: TaskStatus },

    #[error("Assignee must be a member of the organization")]
    InvalidAssignee,

    #[error("Invitation has already been used")]
    InvitationAlreadyUsed,

    #[error("Invitation has expired")]
    InvitationExpired,

    #[error("User is already a member of this organization")]
    AlreadyMember,

    #[error("A user with this email already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    Conflict(String),

    #[error("Health check failed: {0}")]
    HealthCheck(String),

    /// Unexpected failure; the detail is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::InvalidCredentials => "INVALID_CREDENTIALS",
            ServiceError::InvalidToken => "INVALID_TOKEN",
            ServiceError::AccessDenied => "ACCESS_DENIED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(resource) => resource.not_found_code(),
            ServiceError::TagNotAttached => "TAG_NOT_ATTACHED",
            ServiceError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            ServiceError::InvalidAssignee => "INVALID_ASSIGNEE",
            ServiceError::InvitationAlreadyUsed => "INVITATION_ALREADY_USED",
            ServiceError::InvitationExpired => "INVITATION_EXPIRED",
            ServiceError::AlreadyMember => "ALREADY_MEMBER",
            ServiceError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::HealthCheck(_) => "HEALTH_CHECK_ERROR",
            ServiceError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Maps a store error, reading `NotFound` as `resource` having vanished
    pub fn from_store(err: StoreError, resource: Resource) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound(resource),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Duplicate entry ({})", constraint))
            }
            StoreError::NotFound => ServiceError::Internal("record not found".to_string()),
            StoreError::Database(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => ServiceError::AccessDenied,
            AuthzError::InsufficientRole { .. } => {
                ServiceError::Forbidden("Insufficient role for this action".to_string())
            }
            AuthzError::Store(e) => e.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
