//! Request lifecycle engine
//!
//! Join applications, project invitations, and friend requests all follow the
//! same shape: a pending record addressed to exactly one responder, a
//! correlated notification, and a single accept/decline resolution with
//! kind-specific side effects. This module is that shared state machine;
//! the per-kind behavior plugs in through [`RequestPipeline`].
//!
//! Ordering inside a resolution is fixed: commit side effects first, then the
//! correlated notification flip, then the terminal status write. The caller
//! wraps the whole sequence in one transaction, so a failure at any step
//! leaves the request pending and its notification unread.

use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::notifications::{self, EmitNotificationInput};
use crate::error::MatchError;

/// The three request flavors; serialized with their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "project_application")]
    JoinApplication,
    #[serde(rename = "invitation")]
    ProjectInvitation,
    #[serde(rename = "request")]
    FriendRequest,
}

impl RequestKind {
    /// Stable wire code, reused as the notification type
    pub fn code(&self) -> &'static str {
        match self {
            RequestKind::JoinApplication => "project_application",
            RequestKind::ProjectInvitation => "invitation",
            RequestKind::FriendRequest => "request",
        }
    }

    /// Parse a wire code back into a kind
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "project_application" => Some(RequestKind::JoinApplication),
            "invitation" => Some(RequestKind::ProjectInvitation),
            "request" => Some(RequestKind::FriendRequest),
            _ => None,
        }
    }
}

/// Typed reference from a notification back to the request that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRef {
    pub kind: RequestKind,
    pub id: String,
}

impl RequestRef {
    pub fn new(kind: RequestKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A responder's verdict on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    /// Parse the wire spellings used by the clients: the terminal status
    /// vocabularies double as decisions
    pub fn parse(value: &str) -> Result<Self, MatchError> {
        match value.to_ascii_lowercase().as_str() {
            "accept" | "accepted" => Ok(Decision::Accept),
            "decline" | "declined" | "reject" | "rejected" => Ok(Decision::Decline),
            other => Err(MatchError::InvalidInput(format!(
                "Invalid decision: {}",
                other
            ))),
        }
    }
}

/// The engine's view of a loaded request
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub reference: RequestRef,
    /// The single party allowed to resolve this request
    pub responder: String,
    pub pending: bool,
}

/// Outcome of a resolution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(flatten)]
    pub reference: RequestRef,
    pub status: String,
    pub final_role: Option<String>,
}

/// Per-kind strategy plugged into the shared state machine
pub trait RequestPipeline {
    fn kind(&self) -> RequestKind;

    /// Load the request and identify its responder
    fn load(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> Result<PendingRequest, MatchError>;

    /// Apply the accept side effects (membership seat, ledger claim,
    /// friendship edge). Returns the granted role where one applies.
    fn commit(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        role_override: Option<&str>,
    ) -> Result<Option<String>, MatchError>;

    /// Write the terminal status in the kind's own vocabulary; returns it
    fn finalize(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        decision: Decision,
        final_role: Option<&str>,
    ) -> Result<String, MatchError>;
}

/// Resolve a pending request.
///
/// Must run inside a transaction owned by the caller: every side effect here
/// rolls back together.
pub fn respond(
    conn: &mut SqliteConnection,
    pipeline: &dyn RequestPipeline,
    responder: &str,
    request_id: &str,
    decision: Decision,
    role_override: Option<&str>,
) -> Result<Resolution, MatchError> {
    let request = pipeline.load(conn, request_id)?;

    if request.responder != responder {
        return Err(MatchError::Forbidden(
            "Only the addressed party may respond to this request".into(),
        ));
    }

    if !request.pending {
        return Err(MatchError::AlreadyResolved(request_id.to_string()));
    }

    let final_role = match decision {
        Decision::Accept => pipeline.commit(conn, request_id, role_override)?,
        Decision::Decline => None,
    };

    let kind = pipeline.kind();
    notifications::mark_related_read(conn, responder, kind.code(), request_id)?;

    let status = pipeline.finalize(conn, request_id, decision, final_role.as_deref())?;

    debug!(
        kind = kind.code(),
        id = %request_id,
        status = %status,
        "Request resolved"
    );

    Ok(Resolution {
        reference: RequestRef::new(kind, request_id),
        status,
        final_role,
    })
}

/// Append the notification correlated to a freshly created request.
///
/// Runs in the same transaction as the request insert: a request either
/// exists together with its notification or not at all.
pub fn notify_created(
    conn: &mut SqliteConnection,
    reference: &RequestRef,
    recipient_id: &str,
    title: &str,
    message: &str,
    link: Option<&str>,
) -> Result<(), MatchError> {
    notifications::insert_notification(
        conn,
        &EmitNotificationInput {
            recipient_id: recipient_id.to_string(),
            notif_type: reference.kind.code().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            link: link.map(|l| l.to_string()),
            related_kind: Some(reference.kind.code().to_string()),
            related_id: Some(reference.id.clone()),
        },
    )?;

    Ok(())
}

/// Guard against self-addressed invitations and friend requests
pub fn ensure_distinct(initiator: &str, target: &str) -> Result<(), MatchError> {
    if initiator == target {
        return Err(MatchError::SelfReference);
    }
    Ok(())
}

/// Pick the role a commit grants.
///
/// An explicit override must name a role inside the offered set. Without an
/// override, the first offered role wins; with nothing offered, the
/// configured fallback role is granted.
pub fn resolve_role(
    offered: &[String],
    role_override: Option<&str>,
    fallback: &str,
) -> Result<String, MatchError> {
    match role_override {
        Some(role) => {
            if offered.iter().any(|r| r == role) {
                Ok(role.to_string())
            } else {
                Err(MatchError::InvalidRole(format!(
                    "Role {} is not among the offered roles {:?}",
                    role, offered
                )))
            }
        }
        None => Ok(offered
            .first()
            .cloned()
            .unwrap_or_else(|| fallback.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parse_vocabularies() {
        assert_eq!(Decision::parse("accepted").unwrap(), Decision::Accept);
        assert_eq!(Decision::parse("ACCEPTED").unwrap(), Decision::Accept);
        assert_eq!(Decision::parse("declined").unwrap(), Decision::Decline);
        assert_eq!(Decision::parse("REJECTED").unwrap(), Decision::Decline);
        assert!(Decision::parse("maybe").is_err());
    }

    #[test]
    fn test_kind_codes_roundtrip() {
        for kind in [
            RequestKind::JoinApplication,
            RequestKind::ProjectInvitation,
            RequestKind::FriendRequest,
        ] {
            assert_eq!(RequestKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(RequestKind::from_code("message"), None);
    }

    #[test]
    fn test_resolve_role_default_is_first_offered() {
        let offered = vec!["frontend".to_string(), "backend".to_string()];
        assert_eq!(resolve_role(&offered, None, "Member").unwrap(), "frontend");
    }

    #[test]
    fn test_resolve_role_override_must_be_offered() {
        let offered = vec!["frontend".to_string(), "backend".to_string()];
        assert_eq!(
            resolve_role(&offered, Some("backend"), "Member").unwrap(),
            "backend"
        );
        assert!(matches!(
            resolve_role(&offered, Some("designer"), "Member"),
            Err(MatchError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_resolve_role_fallback_when_nothing_offered() {
        assert_eq!(resolve_role(&[], None, "Member").unwrap(), "Member");
        assert!(matches!(
            resolve_role(&[], Some("frontend"), "Member"),
            Err(MatchError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_ensure_distinct() {
        assert!(ensure_distinct("alice", "bob").is_ok());
        assert!(matches!(
            ensure_distinct("alice", "alice"),
            Err(MatchError::SelfReference)
        ));
    }
}
