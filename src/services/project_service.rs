//! Project service - aggregate operations plus the join-application pipeline
//!
//! Wraps the project repository with validation, the request lifecycle engine
//! for application decisions, and event emission.

use std::sync::Arc;

use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::db::models::{application_statuses, Application, Project, ProjectMember, ProjectRole};
use crate::db::{invitations, profiles, projects, Db};
use crate::error::MatchError;

use super::events::{DomainEvent, EventBus};
use super::lifecycle::{
    self, Decision, PendingRequest, RequestKind, RequestPipeline, RequestRef, Resolution,
};

/// Project detail returned to clients: the aggregate with its ledger and seats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub roles: Vec<ProjectRole>,
    pub members: Vec<ProjectMember>,
}

/// Application detail for the cross-project lookup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    pub project_id: String,
    pub project_title: String,
    pub application: Application,
}

/// Join-application flavor of the request lifecycle
pub struct JoinApplicationPipeline {
    fallback_role: String,
}

impl RequestPipeline for JoinApplicationPipeline {
    fn kind(&self) -> RequestKind {
        RequestKind::JoinApplication
    }

    fn load(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> Result<PendingRequest, MatchError> {
        let application = projects::get_application(conn, request_id)?.ok_or_else(|| {
            MatchError::NotFound(format!("Application {} not found", request_id))
        })?;
        let project = projects::require_project(conn, &application.project_id)?;

        Ok(PendingRequest {
            reference: RequestRef::new(RequestKind::JoinApplication, request_id),
            responder: project.owner_id,
            pending: application_statuses::is_pending(&application.status),
        })
    }

    fn commit(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        role_override: Option<&str>,
    ) -> Result<Option<String>, MatchError> {
        let application = projects::get_application(conn, request_id)?.ok_or_else(|| {
            MatchError::NotFound(format!("Application {} not found", request_id))
        })?;

        if projects::is_member(conn, &application.project_id, &application.applicant_id)? {
            return Err(MatchError::AlreadyMember);
        }

        let role = lifecycle::resolve_role(
            &application.preferred_roles(),
            role_override,
            &self.fallback_role,
        )?;

        projects::increment_filled(conn, &application.project_id, &role)?;
        projects::insert_member(conn, &application.project_id, &application.applicant_id, &role)?;

        Ok(Some(role))
    }

    fn finalize(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        decision: Decision,
        final_role: Option<&str>,
    ) -> Result<String, MatchError> {
        let status = match decision {
            Decision::Accept => application_statuses::ACCEPTED,
            Decision::Decline => application_statuses::REJECTED,
        };
        projects::resolve_application(conn, request_id, status, final_role)?;
        Ok(status.to_string())
    }
}

/// Project service
pub struct ProjectService {
    db: Arc<Db>,
    events: Arc<EventBus>,
    fallback_role: String,
    default_owner_role: String,
}

impl ProjectService {
    /// Create a new project service
    pub fn new(
        db: Arc<Db>,
        events: Arc<EventBus>,
        fallback_role: String,
        default_owner_role: String,
    ) -> Self {
        Self {
            db,
            events,
            fallback_role,
            default_owner_role,
        }
    }

    fn pipeline(&self) -> JoinApplicationPipeline {
        JoinApplicationPipeline {
            fallback_role: self.fallback_role.clone(),
        }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// List projects with filtering, newest first
    pub fn list(&self, query: &projects::ProjectQuery) -> Result<Vec<Project>, MatchError> {
        self.db.with_conn(|conn| projects::list_projects(conn, query))
    }

    /// Get a project with its role ledger and members
    pub fn get(&self, project_id: &str) -> Result<ProjectDetail, MatchError> {
        self.db.with_conn(|conn| {
            let project = projects::require_project(conn, project_id)?;
            let roles = projects::list_roles(conn, project_id)?;
            let members = projects::list_members(conn, project_id)?;

            Ok(ProjectDetail {
                project,
                roles,
                members,
            })
        })
    }

    /// List a project's applications; owner only
    pub fn list_applications(
        &self,
        project_id: &str,
        actor_id: &str,
    ) -> Result<Vec<Application>, MatchError> {
        self.db.with_conn(|conn| {
            let project = projects::require_project(conn, project_id)?;
            if project.owner_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Only the project owner may list applications".into(),
                ));
            }
            projects::list_applications(conn, project_id)
        })
    }

    /// Look up one application across projects; readable by the project owner
    /// and the applicant
    pub fn application_details(
        &self,
        application_id: &str,
        actor_id: &str,
    ) -> Result<ApplicationDetail, MatchError> {
        self.db.with_conn(|conn| {
            let application = projects::get_application(conn, application_id)?.ok_or_else(|| {
                MatchError::NotFound(format!("Application {} not found", application_id))
            })?;
            let project = projects::require_project(conn, &application.project_id)?;

            if project.owner_id != actor_id && application.applicant_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Not a party to this application".into(),
                ));
            }

            Ok(ApplicationDetail {
                project_id: project.id,
                project_title: project.title,
                application,
            })
        })
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create a project: declare the role ledger and seat the owner
    pub fn create(&self, input: projects::CreateProjectInput) -> Result<Project, MatchError> {
        if input.owner_id.trim().is_empty() {
            return Err(MatchError::InvalidInput("Owner is required".into()));
        }

        let owner_role = input
            .owner_role
            .clone()
            .unwrap_or_else(|| self.default_owner_role.clone());

        let project = self
            .db
            .transaction(|conn| projects::create_project(conn, &input, &owner_role))?;

        self.events.emit(DomainEvent::ProjectCreated {
            id: project.id.clone(),
            title: project.title.clone(),
            owner_id: project.owner_id.clone(),
        });

        Ok(project)
    }

    /// Submit a join application and notify the project owner
    pub fn apply(
        &self,
        project_id: &str,
        input: projects::CreateApplicationInput,
    ) -> Result<Application, MatchError> {
        if input.applicant_id.trim().is_empty() {
            return Err(MatchError::InvalidInput("Applicant is required".into()));
        }

        let application = self.db.transaction(|conn| {
            let project = projects::require_project(conn, project_id)?;

            if projects::is_member(conn, project_id, &input.applicant_id)? {
                return Err(MatchError::AlreadyMember);
            }
            if projects::pending_application_exists(conn, project_id, &input.applicant_id)? {
                return Err(MatchError::AlreadyApplied);
            }

            let application = projects::insert_application(conn, project_id, &input)?;

            let applicant_name = profiles::display_name(conn, &input.applicant_id)?;
            let roles_str = input.preferred_roles.join(", ");
            lifecycle::notify_created(
                conn,
                &RequestRef::new(RequestKind::JoinApplication, application.id.clone()),
                &project.owner_id,
                "New Project Application",
                &format!(
                    "{} applied for \"{}\" ({})",
                    applicant_name, project.title, roles_str
                ),
                Some(&format!(
                    "/workspace?id={}&tab=applications",
                    project.id
                )),
            )?;

            Ok(application)
        })?;

        self.events.emit(DomainEvent::ApplicationSubmitted {
            id: application.id.clone(),
            project_id: project_id.to_string(),
            applicant_id: application.applicant_id.clone(),
        });

        Ok(application)
    }

    /// Decide an application; owner only. Accepting seats the applicant and
    /// claims a ledger slot for the granted role.
    pub fn decide_application(
        &self,
        project_id: &str,
        application_id: &str,
        actor_id: &str,
        decision: &str,
        role: Option<&str>,
    ) -> Result<Resolution, MatchError> {
        let decision = Decision::parse(decision)?;
        let pipeline = self.pipeline();

        let (resolution, applicant_id) = self.db.transaction(|conn| {
            let application = projects::get_application(conn, application_id)?.ok_or_else(|| {
                MatchError::NotFound(format!("Application {} not found", application_id))
            })?;
            if application.project_id != project_id {
                return Err(MatchError::NotFound(format!(
                    "Application {} not found on this project",
                    application_id
                )));
            }

            let resolution =
                lifecycle::respond(conn, &pipeline, actor_id, application_id, decision, role)?;
            Ok((resolution, application.applicant_id))
        })?;

        self.events.emit(DomainEvent::ApplicationDecided {
            id: application_id.to_string(),
            project_id: project_id.to_string(),
            status: resolution.status.clone(),
        });
        if let Some(ref role) = resolution.final_role {
            self.events.emit(DomainEvent::MemberJoined {
                project_id: project_id.to_string(),
                user_id: applicant_id,
                role: role.clone(),
            });
        }

        Ok(resolution)
    }

    /// Update the project lifecycle status; owner only
    pub fn update_status(
        &self,
        project_id: &str,
        actor_id: &str,
        status: &str,
    ) -> Result<Project, MatchError> {
        let project = self.db.transaction(|conn| {
            let project = projects::require_project(conn, project_id)?;
            if project.owner_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Only the project owner may change its status".into(),
                ));
            }
            projects::update_status(conn, project_id, status)
        })?;

        self.events.emit(DomainEvent::ProjectStatusChanged {
            id: project.id.clone(),
            status: project.status.clone(),
        });

        Ok(project)
    }

    /// Leave a project: remove the seat and release its ledger slot
    pub fn leave(&self, project_id: &str, user_id: &str) -> Result<(), MatchError> {
        self.db.transaction(|conn| {
            let project = projects::require_project(conn, project_id)?;
            if project.owner_id == user_id {
                return Err(MatchError::OwnerCannotLeave);
            }

            let member = projects::get_member(conn, project_id, user_id)?
                .ok_or(MatchError::NotAMember)?;

            projects::remove_member(conn, project_id, user_id)?;
            projects::decrement_filled(conn, project_id, &member.role_name)?;

            Ok(())
        })?;

        self.events.emit(DomainEvent::MemberLeft {
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
        });

        Ok(())
    }

    /// Terminate a project; owner only. Deletes the aggregate and every
    /// invitation referencing it.
    pub fn terminate(&self, project_id: &str, actor_id: &str) -> Result<(), MatchError> {
        self.db.transaction(|conn| {
            let project = projects::require_project(conn, project_id)?;
            if project.owner_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Only the project owner may terminate it".into(),
                ));
            }

            invitations::delete_for_project(conn, project_id)?;
            projects::delete_project_aggregate(conn, project_id)?;

            Ok(())
        })?;

        self.events.emit(DomainEvent::ProjectTerminated {
            id: project_id.to_string(),
        });

        Ok(())
    }
}
