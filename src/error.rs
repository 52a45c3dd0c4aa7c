//! Error types for matchboard

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("A pending request already exists: {0}")]
    DuplicatePending(String),

    #[error("Already applied to this project")]
    AlreadyApplied,

    #[error("Already a member of this project")]
    AlreadyMember,

    #[error("Already friends")]
    AlreadyFriends,

    #[error("Request already resolved: {0}")]
    AlreadyResolved(String),

    #[error("Role is at capacity: {0}")]
    RoleFull(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Cannot send a request to yourself")]
    SelfReference,

    #[error("Owner cannot leave their own project")]
    OwnerCannotLeave,

    #[error("Not a member of this project")]
    NotAMember,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Stable machine-readable code surfaced in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::NotFound(_) => "NOT_FOUND",
            MatchError::Forbidden(_) => "FORBIDDEN",
            MatchError::DuplicatePending(_) => "DUPLICATE_PENDING",
            MatchError::AlreadyApplied => "ALREADY_APPLIED",
            MatchError::AlreadyMember => "ALREADY_MEMBER",
            MatchError::AlreadyFriends => "ALREADY_FRIENDS",
            MatchError::AlreadyResolved(_) => "ALREADY_RESOLVED",
            MatchError::RoleFull(_) => "ROLE_FULL",
            MatchError::InvalidRole(_) => "INVALID_ROLE",
            MatchError::SelfReference => "SELF_REFERENCE",
            MatchError::OwnerCannotLeave => "OWNER_CANNOT_LEAVE",
            MatchError::NotAMember => "NOT_A_MEMBER",
            MatchError::InvalidInput(_) => "INVALID_INPUT",
            MatchError::Database(_) => "DATABASE_ERROR",
            MatchError::Connection(_) => "CONNECTION_ERROR",
            MatchError::Io(_) => "IO_ERROR",
            MatchError::Json(_) => "JSON_ERROR",
            MatchError::Config(_) => "CONFIG_ERROR",
            MatchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for the conflict family (duplicate or already-settled state).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            MatchError::DuplicatePending(_)
                | MatchError::AlreadyApplied
                | MatchError::AlreadyMember
                | MatchError::AlreadyFriends
                | MatchError::AlreadyResolved(_)
                | MatchError::RoleFull(_)
        )
    }
}
