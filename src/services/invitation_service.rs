//! Invitation service - the owner-to-candidate pipeline
//!
//! Creation is owner-only and deduplicated per (project, candidate);
//! resolution goes through the shared lifecycle engine and, on accept, seats
//! the candidate and claims a ledger slot.

use std::sync::Arc;

use diesel::sqlite::SqliteConnection;

use crate::db::models::{request_statuses, Invitation};
use crate::db::{invitations, profiles, projects, Db};
use crate::error::MatchError;

use super::events::{DomainEvent, EventBus};
use super::lifecycle::{
    self, Decision, PendingRequest, RequestKind, RequestPipeline, RequestRef, Resolution,
};

/// Project-invitation flavor of the request lifecycle
pub struct ProjectInvitationPipeline {
    fallback_role: String,
}

impl RequestPipeline for ProjectInvitationPipeline {
    fn kind(&self) -> RequestKind {
        RequestKind::ProjectInvitation
    }

    fn load(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> Result<PendingRequest, MatchError> {
        let invitation = invitations::require_invitation(conn, request_id)?;

        Ok(PendingRequest {
            reference: RequestRef::new(RequestKind::ProjectInvitation, request_id),
            responder: invitation.to_user_id,
            pending: request_statuses::is_pending(&invitation.status),
        })
    }

    fn commit(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        role_override: Option<&str>,
    ) -> Result<Option<String>, MatchError> {
        let invitation = invitations::require_invitation(conn, request_id)?;
        let project = projects::require_project(conn, &invitation.project_id)?;

        if projects::is_member(conn, &project.id, &invitation.to_user_id)? {
            return Err(MatchError::AlreadyMember);
        }

        let role =
            lifecycle::resolve_role(&invitation.roles(), role_override, &self.fallback_role)?;

        projects::increment_filled(conn, &project.id, &role)?;
        projects::insert_member(conn, &project.id, &invitation.to_user_id, &role)?;

        Ok(Some(role))
    }

    fn finalize(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        decision: Decision,
        _final_role: Option<&str>,
    ) -> Result<String, MatchError> {
        let status = match decision {
            Decision::Accept => request_statuses::ACCEPTED,
            Decision::Decline => request_statuses::DECLINED,
        };
        invitations::resolve_invitation(conn, request_id, status)?;
        Ok(status.to_string())
    }
}

/// Invitation service
pub struct InvitationService {
    db: Arc<Db>,
    events: Arc<EventBus>,
    fallback_role: String,
}

impl InvitationService {
    /// Create a new invitation service
    pub fn new(db: Arc<Db>, events: Arc<EventBus>, fallback_role: String) -> Self {
        Self {
            db,
            events,
            fallback_role,
        }
    }

    fn pipeline(&self) -> ProjectInvitationPipeline {
        ProjectInvitationPipeline {
            fallback_role: self.fallback_role.clone(),
        }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get an invitation; readable only by its sender and its candidate
    pub fn get(&self, invitation_id: &str, actor_id: &str) -> Result<Invitation, MatchError> {
        self.db.with_conn(|conn| {
            let invitation = invitations::require_invitation(conn, invitation_id)?;
            if invitation.from_user_id != actor_id && invitation.to_user_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Not a party to this invitation".into(),
                ));
            }
            Ok(invitation)
        })
    }

    /// List pending invitations addressed to a user
    pub fn list_pending_for(&self, user_id: &str) -> Result<Vec<Invitation>, MatchError> {
        self.db
            .with_conn(|conn| invitations::list_pending_for_user(conn, user_id))
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Send an invitation and notify the candidate
    pub fn invite(&self, input: invitations::CreateInvitationInput) -> Result<Invitation, MatchError> {
        lifecycle::ensure_distinct(&input.from_user_id, &input.to_user_id)?;

        let invitation = self.db.transaction(|conn| {
            let project = projects::require_project(conn, &input.project_id)?;
            if project.owner_id != input.from_user_id {
                return Err(MatchError::Forbidden(
                    "Only the project owner may invite".into(),
                ));
            }

            if invitations::pending_invitation_exists(conn, &project.id, &input.to_user_id)? {
                return Err(MatchError::DuplicatePending(format!(
                    "Invitation to {} already pending for this project",
                    input.to_user_id
                )));
            }
            if projects::is_member(conn, &project.id, &input.to_user_id)? {
                return Err(MatchError::AlreadyMember);
            }

            let invitation = invitations::insert_invitation(conn, &input)?;

            let sender_name = profiles::display_name(conn, &input.from_user_id)?;
            lifecycle::notify_created(
                conn,
                &RequestRef::new(RequestKind::ProjectInvitation, invitation.id.clone()),
                &input.to_user_id,
                "Project Invitation",
                &format!("{} invited you to join \"{}\"", sender_name, project.title),
                Some(&format!("/projects/detail?id={}", project.id)),
            )?;

            Ok(invitation)
        })?;

        self.events.emit(DomainEvent::InvitationSent {
            id: invitation.id.clone(),
            project_id: invitation.project_id.clone(),
            to_user_id: invitation.to_user_id.clone(),
        });

        Ok(invitation)
    }

    /// Resolve an invitation; candidate only. Accepting seats the candidate.
    pub fn respond(
        &self,
        invitation_id: &str,
        actor_id: &str,
        decision: &str,
        role: Option<&str>,
    ) -> Result<Resolution, MatchError> {
        let decision = Decision::parse(decision)?;
        let pipeline = self.pipeline();

        let (resolution, project_id) = self.db.transaction(|conn| {
            let invitation = invitations::require_invitation(conn, invitation_id)?;
            let resolution =
                lifecycle::respond(conn, &pipeline, actor_id, invitation_id, decision, role)?;
            Ok((resolution, invitation.project_id))
        })?;

        self.events.emit(DomainEvent::InvitationDecided {
            id: invitation_id.to_string(),
            status: resolution.status.clone(),
        });
        if let Some(ref role) = resolution.final_role {
            self.events.emit(DomainEvent::MemberJoined {
                project_id,
                user_id: actor_id.to_string(),
                role: role.clone(),
            });
        }

        Ok(resolution)
    }
}
