//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//!
//! API responses serialize camelCase for browser clients; the database keeps
//! snake_case column names.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ============================================================================
// Project Aggregate Models
// ============================================================================

/// Project row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub one_line_description: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub domain: Option<String>,
    pub owner_id: String,
    pub status: String,
    pub created_at: String,
}

/// New project for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub one_line_description: Option<&'a str>,
    pub description: Option<&'a str>,
    pub project_type: Option<&'a str>,
    pub domain: Option<&'a str>,
    pub owner_id: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
}

/// Role capacity ledger entry
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = project_roles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
    pub project_id: String,
    pub role_name: String,
    pub required_count: i32,
    pub filled_count: i32,
}

/// New ledger entry for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_roles)]
pub struct NewProjectRole<'a> {
    pub project_id: &'a str,
    pub role_name: &'a str,
    pub required_count: i32,
    pub filled_count: i32,
}

/// Accepted membership on a project
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = project_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub project_id: String,
    pub user_id: String,
    pub role_name: String,
    pub joined_at: String,
}

/// New membership for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_members)]
pub struct NewProjectMember<'a> {
    pub project_id: &'a str,
    pub user_id: &'a str,
    pub role_name: &'a str,
    pub joined_at: &'a str,
}

/// Join application owned by a project
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = project_applications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub project_id: String,
    pub applicant_id: String,
    pub preferred_roles_json: String,
    pub message: Option<String>,
    pub status: String,
    pub final_role: Option<String>,
    pub applied_at: String,
}

impl Application {
    /// Preferred roles decoded from their JSON column
    pub fn preferred_roles(&self) -> Vec<String> {
        serde_json::from_str(&self.preferred_roles_json).unwrap_or_default()
    }
}

/// New application for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_applications)]
pub struct NewApplication<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub applicant_id: &'a str,
    pub preferred_roles_json: &'a str,
    pub message: Option<&'a str>,
    pub status: &'a str,
    pub applied_at: &'a str,
}

// ============================================================================
// Invitation Models
// ============================================================================

/// Owner-to-candidate project invitation
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = invitations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub project_id: String,
    pub roles_json: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl Invitation {
    /// Candidate roles decoded from their JSON column
    pub fn roles(&self) -> Vec<String> {
        serde_json::from_str(&self.roles_json).unwrap_or_default()
    }
}

/// New invitation for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invitations)]
pub struct NewInvitation<'a> {
    pub id: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: &'a str,
    pub project_id: &'a str,
    pub roles_json: &'a str,
    pub message: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
}

// ============================================================================
// Friend Models
// ============================================================================

/// Peer-to-peer friend request
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// New friend request for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friend_requests)]
pub struct NewFriendRequest<'a> {
    pub id: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: &'a str,
    pub message: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
}

/// Friendship edge; user_a_id sorts before user_b_id so each unordered pair
/// has exactly one canonical row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: String,
    pub user_a_id: String,
    pub user_b_id: String,
    pub created_at: String,
}

impl Friendship {
    /// The other member of the pair, given one member
    pub fn other(&self, user_id: &str) -> &str {
        if self.user_a_id == user_id {
            &self.user_b_id
        } else {
            &self.user_a_id
        }
    }
}

/// New friendship for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship<'a> {
    pub id: &'a str,
    pub user_a_id: &'a str,
    pub user_b_id: &'a str,
    pub created_at: &'a str,
}

// ============================================================================
// Notification Models
// ============================================================================

/// Notification log entry; related_kind + related_id point back at the
/// request that produced it
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub notif_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub related_kind: Option<String>,
    pub related_id: Option<String>,
    pub is_read: i32,
    pub timestamp: String,
}

/// New notification for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification<'a> {
    pub id: &'a str,
    pub recipient_id: &'a str,
    pub notif_type: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub link: Option<&'a str>,
    pub related_kind: Option<&'a str>,
    pub related_id: Option<&'a str>,
    pub is_read: i32,
    pub timestamp: &'a str,
}

// ============================================================================
// Profile Models
// ============================================================================

/// Student profile in the directory
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub college: Option<String>,
    pub major: Option<String>,
    pub bio: Option<String>,
    pub primary_role: Option<String>,
    pub other_roles_json: String,
    pub skills_json: String,
    pub interest_domains_json: String,
    pub links_json: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New profile for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile<'a> {
    pub user_id: &'a str,
    pub display_name: Option<&'a str>,
    pub college: Option<&'a str>,
    pub major: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub primary_role: Option<&'a str>,
    pub other_roles_json: &'a str,
    pub skills_json: &'a str,
    pub interest_domains_json: &'a str,
    pub links_json: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

// ============================================================================
// Status Vocabularies
// ============================================================================

/// Project lifecycle states
pub mod project_statuses {
    pub const OPEN: &str = "OPEN";
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
    pub const COMPLETED: &str = "COMPLETED";

    pub const ALL: [&str; 3] = [OPEN, IN_PROGRESS, COMPLETED];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

/// Join application states (uppercase, kept from the project wire vocabulary)
pub mod application_statuses {
    pub const PENDING: &str = "PENDING";
    pub const ACCEPTED: &str = "ACCEPTED";
    pub const REJECTED: &str = "REJECTED";

    pub fn is_pending(status: &str) -> bool {
        status == PENDING
    }
}

/// Invitation and friend request states (lowercase vocabulary)
pub mod request_statuses {
    pub const PENDING: &str = "pending";
    pub const ACCEPTED: &str = "accepted";
    pub const DECLINED: &str = "declined";

    pub fn is_pending(status: &str) -> bool {
        status == PENDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_vocabularies() {
        assert!(project_statuses::is_valid("OPEN"));
        assert!(!project_statuses::is_valid("open"));
        assert!(application_statuses::is_pending("PENDING"));
        assert!(!application_statuses::is_pending("ACCEPTED"));
        assert!(request_statuses::is_pending("pending"));
    }

    #[test]
    fn test_friendship_other() {
        let f = Friendship {
            id: "f1".into(),
            user_a_id: "alice".into(),
            user_b_id: "bob".into(),
            created_at: current_timestamp(),
        };
        assert_eq!(f.other("alice"), "bob");
        assert_eq!(f.other("bob"), "alice");
    }

    #[test]
    fn test_preferred_roles_decoding() {
        let app = Application {
            id: "a1".into(),
            project_id: "p1".into(),
            applicant_id: "u1".into(),
            preferred_roles_json: r#"["frontend","backend"]"#.into(),
            message: None,
            status: "PENDING".into(),
            final_role: None,
            applied_at: current_timestamp(),
        };
        assert_eq!(app.preferred_roles(), vec!["frontend", "backend"]);
    }
}
