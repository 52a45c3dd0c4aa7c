//! Project invitation records
//!
//! Standalone rows referencing a project and two users by id. Only the
//! addressed candidate may resolve an invitation, and a resolved row is
//! never mutated again.

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::diesel_schema::invitations;
use super::models::{current_timestamp, request_statuses, Invitation, NewInvitation};
use crate::error::MatchError;

/// Input for sending an invitation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationInput {
    pub from_user_id: String,
    pub to_user_id: String,
    pub project_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Get invitation by ID
pub fn get_invitation(
    conn: &mut SqliteConnection,
    invitation_id: &str,
) -> Result<Option<Invitation>, MatchError> {
    invitations::table
        .filter(invitations::id.eq(invitation_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Get invitation by ID, failing when absent
pub fn require_invitation(
    conn: &mut SqliteConnection,
    invitation_id: &str,
) -> Result<Invitation, MatchError> {
    get_invitation(conn, invitation_id)?
        .ok_or_else(|| MatchError::NotFound(format!("Invitation {} not found", invitation_id)))
}

/// Check for a pending invitation to this candidate for this project
pub fn pending_invitation_exists(
    conn: &mut SqliteConnection,
    project_id: &str,
    to_user_id: &str,
) -> Result<bool, MatchError> {
    let count: i64 = invitations::table
        .filter(invitations::project_id.eq(project_id))
        .filter(invitations::to_user_id.eq(to_user_id))
        .filter(invitations::status.eq(request_statuses::PENDING))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// List pending invitations addressed to a user, newest first
pub fn list_pending_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<Invitation>, MatchError> {
    invitations::table
        .filter(invitations::to_user_id.eq(user_id))
        .filter(invitations::status.eq(request_statuses::PENDING))
        .order(invitations::created_at.desc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Create a pending invitation
pub fn insert_invitation(
    conn: &mut SqliteConnection,
    input: &CreateInvitationInput,
) -> Result<Invitation, MatchError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let roles_json = serde_json::to_string(&input.roles)?;

    let new_invitation = NewInvitation {
        id: &id,
        from_user_id: &input.from_user_id,
        to_user_id: &input.to_user_id,
        project_id: &input.project_id,
        roles_json: &roles_json,
        message: input.message.as_deref(),
        status: request_statuses::PENDING,
        created_at: &now,
    };

    diesel::insert_into(invitations::table)
        .values(&new_invitation)
        .execute(conn)?;

    require_invitation(conn, &id)
}

/// Write an invitation's terminal status
pub fn resolve_invitation(
    conn: &mut SqliteConnection,
    invitation_id: &str,
    status: &str,
) -> Result<Invitation, MatchError> {
    diesel::update(invitations::table.filter(invitations::id.eq(invitation_id)))
        .set(invitations::status.eq(status))
        .execute(conn)?;

    require_invitation(conn, invitation_id)
}

/// Delete every invitation referencing a project (project termination cascade)
pub fn delete_for_project(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<usize, MatchError> {
    diesel::delete(invitations::table.filter(invitations::project_id.eq(project_id)))
        .execute(conn)
        .map_err(MatchError::from)
}
