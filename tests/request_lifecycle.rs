//! End-to-end flows for projects, applications, and invitations
//!
//! Every test runs against an in-memory database through the service layer,
//! the same path the HTTP handlers use.

use std::sync::Arc;

use matchboard::db::projects::{CreateApplicationInput, CreateProjectInput, RoleSpec};
use matchboard::db::invitations::CreateInvitationInput;
use matchboard::db::{projects, Db};
use matchboard::{Config, MatchError, Services};

fn setup() -> (Arc<Db>, Services) {
    let db = Arc::new(Db::open_in_memory().expect("open in-memory db"));
    let services = Services::new(db.clone(), &Config::default());
    (db, services)
}

fn role(name: &str, count: i32) -> RoleSpec {
    RoleSpec {
        role: name.to_string(),
        count,
    }
}

/// Owner seats as backend on a {frontend: 2, backend: 1} project
fn create_team_project(services: &Services, owner: &str) -> matchboard::db::Project {
    services
        .project
        .create(CreateProjectInput {
            owner_id: owner.to_string(),
            title: "Capstone Matcher".to_string(),
            one_line_description: Some("Match students to teams".to_string()),
            description: None,
            project_type: Some("Side".to_string()),
            domain: Some("Web".to_string()),
            roles: vec![role("frontend", 2), role("backend", 1)],
            owner_role: Some("backend".to_string()),
        })
        .expect("create project")
}

fn apply(
    services: &Services,
    project_id: &str,
    applicant: &str,
    preferred: &[&str],
) -> Result<matchboard::db::Application, MatchError> {
    services.project.apply(
        project_id,
        CreateApplicationInput {
            applicant_id: applicant.to_string(),
            preferred_roles: preferred.iter().map(|r| r.to_string()).collect(),
            message: Some("Hi, I'd like to join".to_string()),
        },
    )
}

/// Every declared role's filled count matches the members actually holding it
fn assert_ledger_consistent(db: &Db, project_id: &str) {
    db.with_conn(|conn| {
        let roles = projects::list_roles(conn, project_id)?;
        let members = projects::list_members(conn, project_id)?;
        for entry in roles {
            let holding = members
                .iter()
                .filter(|m| m.role_name == entry.role_name)
                .count() as i32;
            assert_eq!(
                entry.filled_count, holding,
                "ledger mismatch for role {}",
                entry.role_name
            );
            assert!(
                entry.filled_count <= entry.required_count,
                "role {} overfilled",
                entry.role_name
            );
        }
        Ok(())
    })
    .expect("ledger check");
}

#[test]
fn create_project_seats_owner_and_seeds_ledger() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    let detail = services.project.get(&project.id).expect("get project");
    assert_eq!(detail.project.status, "OPEN");
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.members[0].user_id, "owner");
    assert_eq!(detail.members[0].role_name, "backend");

    let backend = detail
        .roles
        .iter()
        .find(|r| r.role_name == "backend")
        .expect("backend declared");
    assert_eq!((backend.filled_count, backend.required_count), (1, 1));

    let frontend = detail
        .roles
        .iter()
        .find(|r| r.role_name == "frontend")
        .expect("frontend declared");
    assert_eq!((frontend.filled_count, frontend.required_count), (0, 2));

    assert_ledger_consistent(&db, &project.id);
}

#[test]
fn owner_role_outside_declared_set_has_no_ledger_entry() {
    let (db, services) = setup();
    let project = services
        .project
        .create(CreateProjectInput {
            owner_id: "owner".to_string(),
            title: "Study Group".to_string(),
            one_line_description: None,
            description: None,
            project_type: None,
            domain: None,
            roles: vec![role("frontend", 1)],
            owner_role: None, // defaults to Leader, not declared
        })
        .expect("create project");

    let detail = services.project.get(&project.id).expect("get project");
    assert_eq!(detail.members[0].role_name, "Leader");
    assert_eq!(detail.roles.len(), 1);
    assert_eq!(detail.roles[0].filled_count, 0);
    assert_ledger_consistent(&db, &project.id);
}

#[test]
fn duplicate_role_declarations_are_rejected() {
    let (_db, services) = setup();
    let result = services.project.create(CreateProjectInput {
        owner_id: "owner".to_string(),
        title: "Dup".to_string(),
        one_line_description: None,
        description: None,
        project_type: None,
        domain: None,
        roles: vec![role("frontend", 1), role("frontend", 2)],
        owner_role: None,
    });
    assert!(matches!(result, Err(MatchError::InvalidInput(_))));
}

#[test]
fn application_accept_defaults_to_first_preferred_role() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");
    assert_eq!(application.status, "PENDING");

    let resolution = services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None)
        .expect("accept");
    assert_eq!(resolution.status, "ACCEPTED");
    assert_eq!(resolution.final_role.as_deref(), Some("frontend"));

    let detail = services.project.get(&project.id).expect("get project");
    let frontend = detail
        .roles
        .iter()
        .find(|r| r.role_name == "frontend")
        .unwrap();
    assert_eq!(frontend.filled_count, 1);
    assert!(detail.members.iter().any(|m| m.user_id == "alice"));
    assert_ledger_consistent(&db, &project.id);
}

#[test]
fn pending_application_is_deduplicated() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    apply(&services, &project.id, "alice", &["frontend"]).expect("first apply");
    let second = apply(&services, &project.id, "alice", &["backend"]);
    assert!(matches!(second, Err(MatchError::AlreadyApplied)));
}

#[test]
fn accepted_applicant_cannot_reapply() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");
    services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None)
        .expect("accept");

    // No pending application remains; the member check fires instead
    let again = apply(&services, &project.id, "alice", &["frontend"]);
    assert!(matches!(again, Err(MatchError::AlreadyMember)));
}

#[test]
fn second_decision_is_a_conflict_and_changes_nothing() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");
    services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None)
        .expect("accept");

    let again = services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None);
    assert!(matches!(again, Err(MatchError::AlreadyResolved(_))));

    // No double seat, no double ledger claim
    let detail = services.project.get(&project.id).expect("get project");
    let frontend = detail
        .roles
        .iter()
        .find(|r| r.role_name == "frontend")
        .unwrap();
    assert_eq!(frontend.filled_count, 1);
    assert_eq!(
        detail.members.iter().filter(|m| m.user_id == "alice").count(),
        1
    );
    assert_ledger_consistent(&db, &project.id);
}

#[test]
fn decision_by_non_owner_is_forbidden() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");
    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");

    let result = services
        .project
        .decide_application(&project.id, &application.id, "mallory", "accepted", None);
    assert!(matches!(result, Err(MatchError::Forbidden(_))));

    let listing = services.project.list_applications(&project.id, "mallory");
    assert!(matches!(listing, Err(MatchError::Forbidden(_))));

    // The applicant may read their own application, strangers may not
    assert!(services
        .project
        .application_details(&application.id, "alice")
        .is_ok());
    assert!(matches!(
        services.project.application_details(&application.id, "mallory"),
        Err(MatchError::Forbidden(_))
    ));
}

#[test]
fn role_override_outside_offered_set_is_invalid() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");
    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");

    // backend is declared on the project but alice never offered it
    let result = services.project.decide_application(
        &project.id,
        &application.id,
        "owner",
        "accepted",
        Some("backend"),
    );
    assert!(matches!(result, Err(MatchError::InvalidRole(_))));

    // The failed commit left the application pending and the ledger untouched
    let details = services
        .project
        .application_details(&application.id, "owner")
        .expect("details");
    assert_eq!(details.application.status, "PENDING");
    assert_ledger_consistent(&db, &project.id);

    // A role inside the offered set works
    let resolution = services
        .project
        .decide_application(
            &project.id,
            &application.id,
            "owner",
            "accepted",
            Some("frontend"),
        )
        .expect("accept with explicit role");
    assert_eq!(resolution.final_role.as_deref(), Some("frontend"));
}

#[test]
fn fallback_role_must_be_declared_under_strict_ledger() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    // Nothing offered and no override: the fallback "Member" role is not
    // declared on this project, so the accept is rejected outright
    let application = apply(&services, &project.id, "bob", &[]).expect("apply");
    let result = services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None);
    assert!(matches!(result, Err(MatchError::InvalidRole(_))));
}

#[test]
fn fallback_role_seats_when_declared() {
    let (db, services) = setup();
    let project = services
        .project
        .create(CreateProjectInput {
            owner_id: "owner".to_string(),
            title: "Open Team".to_string(),
            one_line_description: None,
            description: None,
            project_type: None,
            domain: None,
            roles: vec![role("Member", 3)],
            owner_role: Some("Member".to_string()),
        })
        .expect("create project");

    let application = apply(&services, &project.id, "bob", &[]).expect("apply");
    let resolution = services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None)
        .expect("accept");
    assert_eq!(resolution.final_role.as_deref(), Some("Member"));
    assert_ledger_consistent(&db, &project.id);
}

#[test]
fn rejection_keeps_applicant_out() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");
    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");

    let resolution = services
        .project
        .decide_application(&project.id, &application.id, "owner", "rejected", None)
        .expect("reject");
    assert_eq!(resolution.status, "REJECTED");
    assert!(resolution.final_role.is_none());

    let detail = services.project.get(&project.id).expect("get project");
    assert!(!detail.members.iter().any(|m| m.user_id == "alice"));
    assert_ledger_consistent(&db, &project.id);

    // A rejected application is settled; rejecting again is a conflict
    let again = services
        .project
        .decide_application(&project.id, &application.id, "owner", "rejected", None);
    assert!(matches!(again, Err(MatchError::AlreadyResolved(_))));

    // ...but alice may apply afresh
    apply(&services, &project.id, "alice", &["frontend"]).expect("re-apply after rejection");
}

// ============================================================================
// Invitations
// ============================================================================

fn invite(
    services: &Services,
    project_id: &str,
    from: &str,
    to: &str,
    roles: &[&str],
) -> Result<matchboard::db::Invitation, MatchError> {
    services.invitation.invite(CreateInvitationInput {
        from_user_id: from.to_string(),
        to_user_id: to.to_string(),
        project_id: project_id.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        message: Some("Join us".to_string()),
    })
}

#[test]
fn invitation_accept_seats_candidate_and_claims_ledger() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    let invitation = invite(&services, &project.id, "owner", "carol", &["frontend"])
        .expect("invite");
    assert_eq!(invitation.status, "pending");

    let inbox = services
        .invitation
        .list_pending_for("carol")
        .expect("pending invitations");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, invitation.id);

    let resolution = services
        .invitation
        .respond(&invitation.id, "carol", "accepted", None)
        .expect("accept");
    assert_eq!(resolution.status, "accepted");
    assert_eq!(resolution.final_role.as_deref(), Some("frontend"));

    let detail = services.project.get(&project.id).expect("get project");
    assert!(detail
        .members
        .iter()
        .any(|m| m.user_id == "carol" && m.role_name == "frontend"));
    assert_ledger_consistent(&db, &project.id);

    // A resolved invitation no longer shows as pending
    assert!(services
        .invitation
        .list_pending_for("carol")
        .expect("pending invitations")
        .is_empty());
}

#[test]
fn invitation_into_full_role_is_rejected_whole() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    // backend is already 1/1 (the owner's seat)
    let invitation =
        invite(&services, &project.id, "owner", "bob", &["backend"]).expect("invite");

    let result = services
        .invitation
        .respond(&invitation.id, "bob", "accepted", None);
    assert!(matches!(result, Err(MatchError::RoleFull(_))));

    // The failed commit rolled back as a unit: still pending, not a member,
    // notification still unread
    let reloaded = services.invitation.get(&invitation.id, "bob").expect("get");
    assert_eq!(reloaded.status, "pending");

    let detail = services.project.get(&project.id).expect("get project");
    assert!(!detail.members.iter().any(|m| m.user_id == "bob"));
    assert_ledger_consistent(&db, &project.id);

    let notifications = services.notification.list_for("bob").expect("list");
    let correlated = notifications
        .iter()
        .find(|n| n.related_id.as_deref() == Some(invitation.id.as_str()))
        .expect("correlated notification");
    assert_eq!(correlated.is_read, 0);

    // Declining still works afterwards
    let resolution = services
        .invitation
        .respond(&invitation.id, "bob", "declined", None)
        .expect("decline");
    assert_eq!(resolution.status, "declined");
}

#[test]
fn invitation_guards() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    // Self-invite
    let result = invite(&services, &project.id, "owner", "owner", &[]);
    assert!(matches!(result, Err(MatchError::SelfReference)));

    // Non-owner cannot invite
    let result = invite(&services, &project.id, "mallory", "carol", &[]);
    assert!(matches!(result, Err(MatchError::Forbidden(_))));

    // Duplicate pending per (project, candidate)
    invite(&services, &project.id, "owner", "carol", &["frontend"]).expect("invite");
    let result = invite(&services, &project.id, "owner", "carol", &["frontend"]);
    assert!(matches!(result, Err(MatchError::DuplicatePending(_))));

    // Unknown project
    let result = invite(&services, "no-such-project", "owner", "carol", &[]);
    assert!(matches!(result, Err(MatchError::NotFound(_))));
}

#[test]
fn invitation_respond_is_for_the_candidate_only() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");
    let invitation =
        invite(&services, &project.id, "owner", "carol", &["frontend"]).expect("invite");

    let result = services
        .invitation
        .respond(&invitation.id, "owner", "accepted", None);
    assert!(matches!(result, Err(MatchError::Forbidden(_))));

    // Reads are limited to the two parties
    assert!(services.invitation.get(&invitation.id, "owner").is_ok());
    assert!(services.invitation.get(&invitation.id, "carol").is_ok());
    assert!(matches!(
        services.invitation.get(&invitation.id, "mallory"),
        Err(MatchError::Forbidden(_))
    ));
}

#[test]
fn inviting_existing_member_conflicts() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    let invitation =
        invite(&services, &project.id, "owner", "carol", &["frontend"]).expect("invite");
    services
        .invitation
        .respond(&invitation.id, "carol", "accepted", None)
        .expect("accept");

    let result = invite(&services, &project.id, "owner", "carol", &["frontend"]);
    assert!(matches!(result, Err(MatchError::AlreadyMember)));
}

// ============================================================================
// Leave / Status / Termination
// ============================================================================

#[test]
fn leaving_releases_the_ledger_slot() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    let application = apply(&services, &project.id, "alice", &["frontend"]).expect("apply");
    services
        .project
        .decide_application(&project.id, &application.id, "owner", "accepted", None)
        .expect("accept");

    services.project.leave(&project.id, "alice").expect("leave");

    let detail = services.project.get(&project.id).expect("get project");
    assert!(!detail.members.iter().any(|m| m.user_id == "alice"));
    let frontend = detail
        .roles
        .iter()
        .find(|r| r.role_name == "frontend")
        .unwrap();
    assert_eq!(frontend.filled_count, 0);
    assert_ledger_consistent(&db, &project.id);

    let again = services.project.leave(&project.id, "alice");
    assert!(matches!(again, Err(MatchError::NotAMember)));

    let owner = services.project.leave(&project.id, "owner");
    assert!(matches!(owner, Err(MatchError::OwnerCannotLeave)));
}

#[test]
fn status_updates_are_owner_only_and_validated() {
    let (_db, services) = setup();
    let project = create_team_project(&services, "owner");

    let result = services
        .project
        .update_status(&project.id, "mallory", "IN_PROGRESS");
    assert!(matches!(result, Err(MatchError::Forbidden(_))));

    let result = services
        .project
        .update_status(&project.id, "owner", "SHIPPED");
    assert!(matches!(result, Err(MatchError::InvalidInput(_))));

    let updated = services
        .project
        .update_status(&project.id, "owner", "IN_PROGRESS")
        .expect("update status");
    assert_eq!(updated.status, "IN_PROGRESS");
}

#[test]
fn termination_cascades_to_invitations() {
    let (db, services) = setup();
    let project = create_team_project(&services, "owner");

    apply(&services, &project.id, "alice", &["frontend"]).expect("apply");
    let invitation =
        invite(&services, &project.id, "owner", "carol", &["frontend"]).expect("invite");

    let result = services.project.terminate(&project.id, "mallory");
    assert!(matches!(result, Err(MatchError::Forbidden(_))));

    services
        .project
        .terminate(&project.id, "owner")
        .expect("terminate");

    assert!(matches!(
        services.project.get(&project.id),
        Err(MatchError::NotFound(_))
    ));
    assert!(matches!(
        services.invitation.get(&invitation.id, "carol"),
        Err(MatchError::NotFound(_))
    ));

    // Nothing of the aggregate survives
    let stats = db.stats().expect("stats");
    assert_eq!(stats.project_count, 0);
    assert_eq!(stats.application_count, 0);
    assert_eq!(stats.invitation_count, 0);
}

#[test]
fn project_listing_filters() {
    let (_db, services) = setup();
    create_team_project(&services, "owner");
    services
        .project
        .create(CreateProjectInput {
            owner_id: "other".to_string(),
            title: "AI Reading Group".to_string(),
            one_line_description: None,
            description: None,
            project_type: Some("Class".to_string()),
            domain: Some("AI".to_string()),
            roles: vec![],
            owner_role: None,
        })
        .expect("create second project");

    let all = services
        .project
        .list(&Default::default())
        .expect("list all");
    assert_eq!(all.len(), 2);

    let web_only = services
        .project
        .list(&matchboard::db::projects::ProjectQuery {
            domains: vec!["Web".to_string()],
            ..Default::default()
        })
        .expect("list web");
    assert_eq!(web_only.len(), 1);
    assert_eq!(web_only[0].title, "Capstone Matcher");

    let by_owner = services
        .project
        .list(&matchboard::db::projects::ProjectQuery {
            owner: Some("other".to_string()),
            ..Default::default()
        })
        .expect("list by owner");
    assert_eq!(by_owner.len(), 1);
}

#[test]
fn data_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");

    let project_id = {
        let db = Arc::new(Db::open(dir.path()).expect("open db"));
        let services = Services::new(db, &Config::default());
        create_team_project(&services, "owner").id
    };

    let db = Arc::new(Db::open(dir.path()).expect("reopen db"));
    let services = Services::new(db.clone(), &Config::default());
    let detail = services.project.get(&project_id).expect("get after reopen");
    assert_eq!(detail.project.title, "Capstone Matcher");
    assert_eq!(detail.members.len(), 1);
    assert_ledger_consistent(&db, &project_id);
}
