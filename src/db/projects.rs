//! Project aggregate CRUD: the project row plus its owned role ledger,
//! members, and join applications
//!
//! The role ledger is strict: a seat can only be granted for a declared role
//! with free capacity, so `filled_count` always equals the number of members
//! holding that role. The single exception is the owner's seat at creation,
//! which may use a role outside the declared set and then has no ledger entry.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diesel_schema::{project_applications, project_members, project_roles, projects};
use super::models::{
    application_statuses, current_timestamp, project_statuses, Application, NewApplication,
    NewProject, NewProjectMember, NewProjectRole, Project, ProjectMember, ProjectRole,
};
use crate::error::MatchError;

// ============================================================================
// Input / Query Types
// ============================================================================

/// One declared role vacancy on a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    pub role: String,
    pub count: i32,
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub one_line_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    #[serde(default)]
    pub owner_role: Option<String>,
}

/// Query parameters for listing projects
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    /// Filter by project type (any of)
    #[serde(default)]
    pub types: Vec<String>,
    /// Filter by domain (any of)
    #[serde(default)]
    pub domains: Vec<String>,
    /// Filter by owner
    pub owner: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            domains: Vec::new(),
            owner: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    100
}

/// Input for submitting a join application
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationInput {
    pub applicant_id: String,
    #[serde(default)]
    pub preferred_roles: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Project Read Operations
// ============================================================================

/// Get project by ID
pub fn get_project(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Option<Project>, MatchError> {
    projects::table
        .filter(projects::id.eq(project_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Get project by ID, failing when absent
pub fn require_project(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Project, MatchError> {
    get_project(conn, project_id)?
        .ok_or_else(|| MatchError::NotFound(format!("Project {} not found", project_id)))
}

/// List projects with filtering, newest first
pub fn list_projects(
    conn: &mut SqliteConnection,
    query: &ProjectQuery,
) -> Result<Vec<Project>, MatchError> {
    let mut base_query = projects::table.into_boxed();

    if !query.types.is_empty() {
        base_query = base_query.filter(projects::project_type.eq_any(query.types.clone()));
    }

    if !query.domains.is_empty() {
        base_query = base_query.filter(projects::domain.eq_any(query.domains.clone()));
    }

    if let Some(ref owner) = query.owner {
        base_query = base_query.filter(projects::owner_id.eq(owner));
    }

    base_query
        .order(projects::created_at.desc())
        .limit(query.limit)
        .offset(query.offset)
        .load(conn)
        .map_err(MatchError::from)
}

// ============================================================================
// Project Write Operations
// ============================================================================

/// Create a project: insert the row, declare the role ledger, seat the owner.
///
/// Ledger declare seeds every entry at filled 0, except the owner's chosen
/// role, which starts at 1 because the owner occupies one slot immediately.
pub fn create_project(
    conn: &mut SqliteConnection,
    input: &CreateProjectInput,
    owner_role: &str,
) -> Result<Project, MatchError> {
    if input.title.trim().is_empty() {
        return Err(MatchError::InvalidInput("Project title is required".into()));
    }

    let mut seen = std::collections::HashSet::new();
    for spec in &input.roles {
        if spec.role.trim().is_empty() {
            return Err(MatchError::InvalidInput("Role name is required".into()));
        }
        if spec.count < 1 {
            return Err(MatchError::InvalidInput(format!(
                "Role {} must require at least one slot",
                spec.role
            )));
        }
        if !seen.insert(spec.role.as_str()) {
            return Err(MatchError::InvalidInput(format!(
                "Role {} declared more than once",
                spec.role
            )));
        }
    }

    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_project = NewProject {
        id: &id,
        title: &input.title,
        one_line_description: input.one_line_description.as_deref(),
        description: input.description.as_deref(),
        project_type: input.project_type.as_deref(),
        domain: input.domain.as_deref(),
        owner_id: &input.owner_id,
        status: project_statuses::OPEN,
        created_at: &now,
    };

    diesel::insert_into(projects::table)
        .values(&new_project)
        .execute(conn)?;

    for spec in &input.roles {
        let filled = if spec.role == owner_role { 1 } else { 0 };
        let new_role = NewProjectRole {
            project_id: &id,
            role_name: &spec.role,
            required_count: spec.count,
            filled_count: filled,
        };
        diesel::insert_into(project_roles::table)
            .values(&new_role)
            .execute(conn)?;
    }

    let owner_member = NewProjectMember {
        project_id: &id,
        user_id: &input.owner_id,
        role_name: owner_role,
        joined_at: &now,
    };
    diesel::insert_into(project_members::table)
        .values(&owner_member)
        .execute(conn)?;

    require_project(conn, &id)
}

/// Update the project lifecycle status
pub fn update_status(
    conn: &mut SqliteConnection,
    project_id: &str,
    status: &str,
) -> Result<Project, MatchError> {
    if !project_statuses::is_valid(status) {
        return Err(MatchError::InvalidInput(format!(
            "Invalid project status: {}. Valid statuses: {:?}",
            status,
            project_statuses::ALL
        )));
    }

    diesel::update(projects::table.filter(projects::id.eq(project_id)))
        .set(projects::status.eq(status))
        .execute(conn)?;

    require_project(conn, project_id)
}

/// Delete a project and everything it owns (roles, members, applications).
/// Invitations referencing the project are cleaned up separately.
pub fn delete_project_aggregate(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<bool, MatchError> {
    diesel::delete(
        project_applications::table.filter(project_applications::project_id.eq(project_id)),
    )
    .execute(conn)?;
    diesel::delete(project_members::table.filter(project_members::project_id.eq(project_id)))
        .execute(conn)?;
    diesel::delete(project_roles::table.filter(project_roles::project_id.eq(project_id)))
        .execute(conn)?;

    let deleted = diesel::delete(projects::table.filter(projects::id.eq(project_id)))
        .execute(conn)?;

    Ok(deleted > 0)
}

// ============================================================================
// Role Capacity Ledger
// ============================================================================

/// List the role ledger for a project
pub fn list_roles(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<ProjectRole>, MatchError> {
    project_roles::table
        .filter(project_roles::project_id.eq(project_id))
        .order(project_roles::role_name.asc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Get one ledger entry
pub fn get_role(
    conn: &mut SqliteConnection,
    project_id: &str,
    role_name: &str,
) -> Result<Option<ProjectRole>, MatchError> {
    project_roles::table
        .filter(project_roles::project_id.eq(project_id))
        .filter(project_roles::role_name.eq(role_name))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Claim one slot of a declared role.
///
/// Fails with `InvalidRole` when the role is not declared on the project and
/// with `RoleFull` when every slot is taken.
pub fn increment_filled(
    conn: &mut SqliteConnection,
    project_id: &str,
    role_name: &str,
) -> Result<(), MatchError> {
    let role = get_role(conn, project_id, role_name)?.ok_or_else(|| {
        MatchError::InvalidRole(format!(
            "Role {} is not declared on this project",
            role_name
        ))
    })?;

    if role.filled_count >= role.required_count {
        return Err(MatchError::RoleFull(format!(
            "Role {} is full ({}/{})",
            role_name, role.filled_count, role.required_count
        )));
    }

    diesel::update(
        project_roles::table
            .filter(project_roles::project_id.eq(project_id))
            .filter(project_roles::role_name.eq(role_name)),
    )
    .set(project_roles::filled_count.eq(role.filled_count + 1))
    .execute(conn)?;

    Ok(())
}

/// Release one slot of a role, floored at zero. A role missing from the
/// ledger (the owner-seat exception) is skipped.
pub fn decrement_filled(
    conn: &mut SqliteConnection,
    project_id: &str,
    role_name: &str,
) -> Result<(), MatchError> {
    let role = match get_role(conn, project_id, role_name)? {
        Some(role) => role,
        None => return Ok(()),
    };

    if role.filled_count == 0 {
        return Ok(());
    }

    diesel::update(
        project_roles::table
            .filter(project_roles::project_id.eq(project_id))
            .filter(project_roles::role_name.eq(role_name)),
    )
    .set(project_roles::filled_count.eq(role.filled_count - 1))
    .execute(conn)?;

    Ok(())
}

// ============================================================================
// Members
// ============================================================================

/// List members of a project
pub fn list_members(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<ProjectMember>, MatchError> {
    project_members::table
        .filter(project_members::project_id.eq(project_id))
        .order(project_members::joined_at.asc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Get one membership
pub fn get_member(
    conn: &mut SqliteConnection,
    project_id: &str,
    user_id: &str,
) -> Result<Option<ProjectMember>, MatchError> {
    project_members::table
        .filter(project_members::project_id.eq(project_id))
        .filter(project_members::user_id.eq(user_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Check membership
pub fn is_member(
    conn: &mut SqliteConnection,
    project_id: &str,
    user_id: &str,
) -> Result<bool, MatchError> {
    Ok(get_member(conn, project_id, user_id)?.is_some())
}

/// Seat a user on the project
pub fn insert_member(
    conn: &mut SqliteConnection,
    project_id: &str,
    user_id: &str,
    role_name: &str,
) -> Result<ProjectMember, MatchError> {
    let now = current_timestamp();
    let new_member = NewProjectMember {
        project_id,
        user_id,
        role_name,
        joined_at: &now,
    };

    diesel::insert_into(project_members::table)
        .values(&new_member)
        .execute(conn)?;

    get_member(conn, project_id, user_id)?
        .ok_or_else(|| MatchError::Internal("Failed to retrieve created membership".into()))
}

/// Remove a membership
pub fn remove_member(
    conn: &mut SqliteConnection,
    project_id: &str,
    user_id: &str,
) -> Result<bool, MatchError> {
    let deleted = diesel::delete(
        project_members::table
            .filter(project_members::project_id.eq(project_id))
            .filter(project_members::user_id.eq(user_id)),
    )
    .execute(conn)?;

    Ok(deleted > 0)
}

// ============================================================================
// Join Applications
// ============================================================================

/// Get an application by ID (across projects)
pub fn get_application(
    conn: &mut SqliteConnection,
    application_id: &str,
) -> Result<Option<Application>, MatchError> {
    project_applications::table
        .filter(project_applications::id.eq(application_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// List a project's applications, most recent first
pub fn list_applications(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<Application>, MatchError> {
    project_applications::table
        .filter(project_applications::project_id.eq(project_id))
        .order(project_applications::applied_at.desc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Check for a pending application by this applicant
pub fn pending_application_exists(
    conn: &mut SqliteConnection,
    project_id: &str,
    applicant_id: &str,
) -> Result<bool, MatchError> {
    let count: i64 = project_applications::table
        .filter(project_applications::project_id.eq(project_id))
        .filter(project_applications::applicant_id.eq(applicant_id))
        .filter(project_applications::status.eq(application_statuses::PENDING))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// Append a pending application to the project
pub fn insert_application(
    conn: &mut SqliteConnection,
    project_id: &str,
    input: &CreateApplicationInput,
) -> Result<Application, MatchError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let preferred_roles_json = serde_json::to_string(&input.preferred_roles)?;

    let new_application = NewApplication {
        id: &id,
        project_id,
        applicant_id: &input.applicant_id,
        preferred_roles_json: &preferred_roles_json,
        message: input.message.as_deref(),
        status: application_statuses::PENDING,
        applied_at: &now,
    };

    diesel::insert_into(project_applications::table)
        .values(&new_application)
        .execute(conn)?;

    get_application(conn, &id)?
        .ok_or_else(|| MatchError::Internal("Failed to retrieve created application".into()))
}

/// Write an application's terminal status (and the granted role on accept)
pub fn resolve_application(
    conn: &mut SqliteConnection,
    application_id: &str,
    status: &str,
    final_role: Option<&str>,
) -> Result<Application, MatchError> {
    diesel::update(project_applications::table.filter(project_applications::id.eq(application_id)))
        .set((
            project_applications::status.eq(status),
            project_applications::final_role.eq(final_role),
        ))
        .execute(conn)?;

    get_application(conn, application_id)?
        .ok_or_else(|| MatchError::NotFound(format!("Application {} not found", application_id)))
}
