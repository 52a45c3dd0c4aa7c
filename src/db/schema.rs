//! Database schema bootstrap

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use crate::error::MatchError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), MatchError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, MatchError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| {
            MatchError::Internal(format!("Failed to create schema_version table: {}", e))
        })?;

    #[derive(diesel::QueryableByName)]
    struct VersionRow {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        version: i32,
    }

    let version = diesel::sql_query("SELECT version FROM schema_version LIMIT 1")
        .get_result::<VersionRow>(conn)
        .map(|row| row.version)
        .unwrap_or(0);

    Ok(version)
}

/// Set schema version
fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), MatchError> {
    conn.batch_execute(&format!(
        "DELETE FROM schema_version; INSERT INTO schema_version (version) VALUES ({});",
        version
    ))
    .map_err(|e| MatchError::Internal(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &mut SqliteConnection) -> Result<(), MatchError> {
    conn.batch_execute(PROJECTS_SCHEMA)
        .map_err(|e| MatchError::Internal(format!("Failed to create project tables: {}", e)))?;

    conn.batch_execute(REQUESTS_SCHEMA)
        .map_err(|e| MatchError::Internal(format!("Failed to create request tables: {}", e)))?;

    conn.batch_execute(NOTIFICATIONS_SCHEMA)
        .map_err(|e| {
            MatchError::Internal(format!("Failed to create notification tables: {}", e))
        })?;

    conn.batch_execute(INDEXES_SCHEMA)
        .map_err(|e| MatchError::Internal(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &mut SqliteConnection, from_version: i32) -> Result<(), MatchError> {
    // Add migration steps here as schema evolves
    match from_version {
        _ => {}
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Project aggregate: the project row plus its owned roles, members, applications
const PROJECTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    one_line_description TEXT,
    description TEXT,
    project_type TEXT,
    domain TEXT,
    owner_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'OPEN',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project_roles (
    project_id TEXT NOT NULL,
    role_name TEXT NOT NULL,
    required_count INTEGER NOT NULL,
    filled_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (project_id, role_name)
);

CREATE TABLE IF NOT EXISTS project_members (
    project_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    role_name TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS project_applications (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    applicant_id TEXT NOT NULL,
    preferred_roles_json TEXT NOT NULL DEFAULT '[]',
    message TEXT,
    status TEXT NOT NULL DEFAULT 'PENDING',
    final_role TEXT,
    applied_at TEXT NOT NULL
);
"#;

/// Standalone request records: invitations, friend requests, friendships
const REQUESTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS invitations (
    id TEXT PRIMARY KEY,
    from_user_id TEXT NOT NULL,
    to_user_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    roles_json TEXT NOT NULL DEFAULT '[]',
    message TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS friend_requests (
    id TEXT PRIMARY KEY,
    from_user_id TEXT NOT NULL,
    to_user_id TEXT NOT NULL,
    message TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS friendships (
    id TEXT PRIMARY KEY,
    user_a_id TEXT NOT NULL,
    user_b_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_a_id, user_b_id)
);
"#;

/// Notification correlation log and the profile directory
const NOTIFICATIONS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL,
    notif_type TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    link TEXT,
    related_kind TEXT,
    related_id TEXT,
    is_read INTEGER NOT NULL DEFAULT 0,
    timestamp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    display_name TEXT,
    college TEXT,
    major TEXT,
    bio TEXT,
    primary_role TEXT,
    other_roles_json TEXT NOT NULL DEFAULT '[]',
    skills_json TEXT NOT NULL DEFAULT '[]',
    interest_domains_json TEXT NOT NULL DEFAULT '[]',
    links_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);
CREATE INDEX IF NOT EXISTS idx_projects_created ON projects(created_at);
CREATE INDEX IF NOT EXISTS idx_applications_project ON project_applications(project_id);
CREATE INDEX IF NOT EXISTS idx_applications_applicant ON project_applications(applicant_id);
CREATE INDEX IF NOT EXISTS idx_invitations_to ON invitations(to_user_id);
CREATE INDEX IF NOT EXISTS idx_invitations_project ON invitations(project_id);
CREATE INDEX IF NOT EXISTS idx_friend_requests_to ON friend_requests(to_user_id);
CREATE INDEX IF NOT EXISTS idx_friend_requests_from ON friend_requests(from_user_id);
CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id);
CREATE INDEX IF NOT EXISTS idx_notifications_related ON notifications(related_kind, related_id);
"#;
