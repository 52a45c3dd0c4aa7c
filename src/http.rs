//! HTTP API for matchboard
//!
//! REST endpoints over the service layer. Handlers stay thin: parse the
//! request, call one service method, map the result through the response
//! helpers.
//!
//! ## Projects & Applications
//! - `GET /api/projects` - List projects (`type`, `domain`, `owner` filters)
//! - `POST /api/projects` - Create a project (declares roles, seats owner)
//! - `GET /api/projects/{id}` - Project detail with ledger and members
//! - `DELETE /api/projects/{id}?actorId=` - Terminate a project
//! - `PUT /api/projects/{id}/status` - Change lifecycle status
//! - `POST /api/projects/{id}/join` - Submit a join application
//! - `POST /api/projects/{id}/leave` - Leave a project
//! - `GET /api/projects/{id}/applications?actorId=` - List applications
//! - `GET /api/projects/application-details/{appId}?actorId=` - Lookup
//! - `PUT /api/projects/applications/{projectId}/{appId}` - Decide
//!
//! ## Invitations
//! - `POST /api/invitations/project` - Send an invitation
//! - `GET /api/invitations/project/{id}?actorId=` - Get an invitation
//! - `POST /api/invitations/project/{id}/respond` - Accept or decline
//! - `GET /api/invitations?userId=` - Pending invitations for a user
//!
//! ## Friends
//! - `POST /api/friends/request` - Send a friend request
//! - `POST /api/friends/request/{id}/respond` - Accept or decline
//! - `GET /api/friends?userId=` - List friendships
//! - `GET /api/friends/requests?userId=` - Pending requests for a user
//! - `GET /api/friends/status?userId=&otherId=` - Pairwise status
//! - `DELETE /api/friends/{otherId}?actorId=` - Unfriend
//!
//! ## Notifications & Profiles
//! - `GET /api/notifications?userId=` - Poll the notification log
//! - `GET /api/notifications/unread-count?userId=` - Unread badge count
//! - `POST /api/notifications` - Emit a notification
//! - `PUT /api/notifications/{id}/read` - Mark handled
//! - `GET /api/users?college=&major=&primaryRole=` - Profile directory
//! - `GET /api/users/{id}/profile` / `POST /api/users/{id}/profile`

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::db::{friends, invitations, notifications, profiles, projects, Db};
use crate::error::MatchError;
use crate::services::{response, Services};

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    db: Arc<Db>,
    bind_addr: SocketAddr,
}

// ============================================================================
// Request Bodies
// ============================================================================

/// Body for leaving a project
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveBody {
    user_id: String,
}

/// Accept/decline body shared by every decision endpoint. The original
/// clients send the terminal status as the decision, so both spellings parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionBody {
    actor_id: String,
    #[serde(alias = "status")]
    decision: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    actor_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorBody {
    actor_id: String,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(services: Arc<Services>, db: Arc<Db>, bind_addr: SocketAddr) -> Self {
        Self {
            services,
            db,
            bind_addr,
        }
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), MatchError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Route requests to handlers
    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();

        debug!(method = %method, path = %path, "Incoming request");

        let result = match (method, path.as_str()) {
            // Health check
            (Method::GET, "/health") => self.handle_health(),

            // Projects
            (Method::GET, "/api/projects") => self.handle_list_projects(req.uri()),
            (Method::POST, "/api/projects") => self.handle_create_project(req).await,

            (Method::GET, p) if p.starts_with("/api/projects/application-details/") => {
                let app_id = p
                    .strip_prefix("/api/projects/application-details/")
                    .unwrap_or("");
                self.handle_application_details(req.uri(), app_id)
            }
            (Method::PUT, p) if p.starts_with("/api/projects/applications/") => {
                let rest = p.strip_prefix("/api/projects/applications/").unwrap_or("");
                match rest.split_once('/') {
                    Some((project_id, app_id)) => {
                        let project_id = project_id.to_string();
                        let app_id = app_id.to_string();
                        self.handle_decide_application(req, &project_id, &app_id)
                            .await
                    }
                    None => Ok(response::not_found("Application not found")),
                }
            }
            (Method::POST, p)
                if p.starts_with("/api/projects/") && p.ends_with("/join") =>
            {
                let id = trim_segment(p, "/api/projects/", "/join");
                self.handle_apply(req, &id).await
            }
            (Method::POST, p)
                if p.starts_with("/api/projects/") && p.ends_with("/leave") =>
            {
                let id = trim_segment(p, "/api/projects/", "/leave");
                self.handle_leave(req, &id).await
            }
            (Method::PUT, p)
                if p.starts_with("/api/projects/") && p.ends_with("/status") =>
            {
                let id = trim_segment(p, "/api/projects/", "/status");
                self.handle_update_status(req, &id).await
            }
            (Method::GET, p)
                if p.starts_with("/api/projects/") && p.ends_with("/applications") =>
            {
                let id = trim_segment(p, "/api/projects/", "/applications");
                self.handle_list_applications(req.uri(), &id)
            }
            (Method::GET, p) if p.starts_with("/api/projects/") => {
                let id = p.strip_prefix("/api/projects/").unwrap_or("");
                self.handle_get_project(id)
            }
            (Method::DELETE, p) if p.starts_with("/api/projects/") => {
                let id = p.strip_prefix("/api/projects/").unwrap_or("").to_string();
                self.handle_terminate_project(req.uri(), &id)
            }

            // Invitations
            (Method::POST, "/api/invitations/project") => self.handle_invite(req).await,
            (Method::POST, p)
                if p.starts_with("/api/invitations/project/") && p.ends_with("/respond") =>
            {
                let id = trim_segment(p, "/api/invitations/project/", "/respond");
                self.handle_invitation_respond(req, &id).await
            }
            (Method::GET, p) if p.starts_with("/api/invitations/project/") => {
                let id = p.strip_prefix("/api/invitations/project/").unwrap_or("");
                self.handle_get_invitation(req.uri(), id)
            }
            (Method::GET, "/api/invitations") => self.handle_list_invitations(req.uri()),

            // Friends
            (Method::POST, "/api/friends/request") => self.handle_friend_request(req).await,
            (Method::POST, p)
                if p.starts_with("/api/friends/request/") && p.ends_with("/respond") =>
            {
                let id = trim_segment(p, "/api/friends/request/", "/respond");
                self.handle_friend_respond(req, &id).await
            }
            (Method::GET, "/api/friends/requests") => self.handle_friend_requests(req.uri()),
            (Method::GET, "/api/friends/status") => self.handle_friend_status(req.uri()),
            (Method::GET, "/api/friends") => self.handle_list_friends(req.uri()),
            (Method::DELETE, p) if p.starts_with("/api/friends/") => {
                let other_id = p.strip_prefix("/api/friends/").unwrap_or("");
                self.handle_unfriend(req.uri(), other_id)
            }

            // Notifications
            (Method::GET, "/api/notifications") => self.handle_list_notifications(req.uri()),
            (Method::GET, "/api/notifications/unread-count") => {
                self.handle_unread_count(req.uri())
            }
            (Method::POST, "/api/notifications") => self.handle_emit_notification(req).await,
            (Method::PUT, p)
                if p.starts_with("/api/notifications/") && p.ends_with("/read") =>
            {
                let id = trim_segment(p, "/api/notifications/", "/read");
                self.handle_mark_read(req, &id).await
            }

            // Profile directory
            (Method::GET, "/api/users") => self.handle_list_profiles(req.uri()),
            (Method::GET, p)
                if p.starts_with("/api/users/") && p.ends_with("/profile") =>
            {
                let id = trim_segment(p, "/api/users/", "/profile");
                self.handle_get_profile(&id)
            }
            (Method::POST, p)
                if p.starts_with("/api/users/") && p.ends_with("/profile") =>
            {
                let id = trim_segment(p, "/api/users/", "/profile");
                self.handle_upsert_profile(req, &id).await
            }

            // Not found
            _ => Ok(response::not_found("Not Found")),
        };

        match result {
            Ok(resp) => Ok(resp),
            Err(e) => Ok(response::error_response(e)),
        }
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn handle_health(&self) -> Result<Response<Full<Bytes>>, MatchError> {
        let stats = self.db.stats()?;
        Ok(response::ok(&serde_json::json!({
            "status": "ok",
            "stats": stats,
        })))
    }

    fn handle_list_projects(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let params = query_map(uri);
        let query = projects::ProjectQuery {
            types: comma_list(params.get("type")),
            domains: comma_list(params.get("domain")),
            owner: params.get("owner").cloned(),
            ..Default::default()
        };
        Ok(response::from_result(self.services.project.list(&query)))
    }

    async fn handle_create_project(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: projects::CreateProjectInput = read_json(req).await?;
        Ok(response::from_create_result(
            self.services.project.create(input),
        ))
    }

    fn handle_get_project(&self, id: &str) -> Result<Response<Full<Bytes>>, MatchError> {
        Ok(response::from_result(self.services.project.get(id)))
    }

    fn handle_terminate_project(
        &self,
        uri: &Uri,
        id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let actor = require_param(uri, "actorId")?;
        Ok(response::from_delete_result(
            self.services.project.terminate(id, &actor),
        ))
    }

    async fn handle_apply(
        &self,
        req: Request<Incoming>,
        project_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: projects::CreateApplicationInput = read_json(req).await?;
        Ok(response::from_create_result(
            self.services.project.apply(project_id, input),
        ))
    }

    fn handle_list_applications(
        &self,
        uri: &Uri,
        project_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let actor = require_param(uri, "actorId")?;
        Ok(response::from_result(
            self.services.project.list_applications(project_id, &actor),
        ))
    }

    fn handle_application_details(
        &self,
        uri: &Uri,
        application_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let actor = require_param(uri, "actorId")?;
        Ok(response::from_result(
            self.services
                .project
                .application_details(application_id, &actor),
        ))
    }

    async fn handle_decide_application(
        &self,
        req: Request<Incoming>,
        project_id: &str,
        application_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: DecisionBody = read_json(req).await?;
        Ok(response::from_result(self.services.project.decide_application(
            project_id,
            application_id,
            &body.actor_id,
            &body.decision,
            body.role.as_deref(),
        )))
    }

    async fn handle_update_status(
        &self,
        req: Request<Incoming>,
        project_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: StatusBody = read_json(req).await?;
        Ok(response::from_result(self.services.project.update_status(
            project_id,
            &body.actor_id,
            &body.status,
        )))
    }

    async fn handle_leave(
        &self,
        req: Request<Incoming>,
        project_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: LeaveBody = read_json(req).await?;
        Ok(response::from_delete_result(
            self.services.project.leave(project_id, &body.user_id),
        ))
    }

    async fn handle_invite(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: invitations::CreateInvitationInput = read_json(req).await?;
        Ok(response::from_create_result(
            self.services.invitation.invite(input),
        ))
    }

    fn handle_get_invitation(
        &self,
        uri: &Uri,
        id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let actor = require_param(uri, "actorId")?;
        Ok(response::from_result(
            self.services.invitation.get(id, &actor),
        ))
    }

    async fn handle_invitation_respond(
        &self,
        req: Request<Incoming>,
        id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: DecisionBody = read_json(req).await?;
        Ok(response::from_result(self.services.invitation.respond(
            id,
            &body.actor_id,
            &body.decision,
            body.role.as_deref(),
        )))
    }

    fn handle_list_invitations(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        Ok(response::from_result(
            self.services.invitation.list_pending_for(&user),
        ))
    }

    async fn handle_friend_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: friends::CreateFriendRequestInput = read_json(req).await?;
        Ok(response::from_create_result(
            self.services.friend.send_request(input),
        ))
    }

    async fn handle_friend_respond(
        &self,
        req: Request<Incoming>,
        id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: DecisionBody = read_json(req).await?;
        Ok(response::from_result(self.services.friend.respond(
            id,
            &body.actor_id,
            &body.decision,
        )))
    }

    fn handle_list_friends(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        Ok(response::from_result(
            self.services.friend.friendships_of(&user),
        ))
    }

    fn handle_friend_requests(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        Ok(response::from_result(
            self.services.friend.pending_requests_for(&user),
        ))
    }

    fn handle_friend_status(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        let other = require_param(uri, "otherId")?;
        let status = self.services.friend.friend_status(&user, &other)?;
        Ok(response::ok(&serde_json::json!({ "status": status })))
    }

    fn handle_unfriend(
        &self,
        uri: &Uri,
        other_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let actor = require_param(uri, "actorId")?;
        Ok(response::from_delete_result(
            self.services.friend.remove_friendship(&actor, other_id),
        ))
    }

    fn handle_list_notifications(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        Ok(response::from_result(
            self.services.notification.list_for(&user),
        ))
    }

    fn handle_unread_count(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let user = require_param(uri, "userId")?;
        let count = self.services.notification.unread_count(&user)?;
        Ok(response::ok(&serde_json::json!({ "unread": count })))
    }

    async fn handle_emit_notification(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: notifications::EmitNotificationInput = read_json(req).await?;
        Ok(response::from_create_result(
            self.services.notification.emit(input),
        ))
    }

    async fn handle_mark_read(
        &self,
        req: Request<Incoming>,
        id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let body: ActorBody = read_json(req).await?;
        Ok(response::from_result(
            self.services.notification.mark_read(id, &body.actor_id),
        ))
    }

    fn handle_list_profiles(&self, uri: &Uri) -> Result<Response<Full<Bytes>>, MatchError> {
        let params = query_map(uri);
        let query = profiles::ProfileQuery {
            college: params.get("college").cloned(),
            major: params.get("major").cloned(),
            primary_role: params.get("primaryRole").cloned(),
            ..Default::default()
        };
        Ok(response::from_result(self.services.profile.list(&query)))
    }

    fn handle_get_profile(&self, user_id: &str) -> Result<Response<Full<Bytes>>, MatchError> {
        Ok(response::from_result(self.services.profile.get(user_id)))
    }

    async fn handle_upsert_profile(
        &self,
        req: Request<Incoming>,
        user_id: &str,
    ) -> Result<Response<Full<Bytes>>, MatchError> {
        let input: profiles::UpsertProfileInput = read_json(req).await?;
        Ok(response::from_result(
            self.services.profile.upsert(user_id, input),
        ))
    }
}

// ============================================================================
// Parsing Helpers
// ============================================================================

/// Extract the id between a route prefix and suffix
fn trim_segment(path: &str, prefix: &str, suffix: &str) -> String {
    path.strip_prefix(prefix)
        .and_then(|p| p.strip_suffix(suffix))
        .unwrap_or("")
        .to_string()
}

/// Collect and deserialize a JSON request body
async fn read_json<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T, MatchError> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| MatchError::Internal(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    if body.is_empty() {
        return Err(MatchError::InvalidInput("Request body is required".into()));
    }

    serde_json::from_slice(&body)
        .map_err(|e| MatchError::InvalidInput(format!("Invalid request body: {}", e)))
}

/// Parse the query string into a map
fn query_map(uri: &Uri) -> HashMap<String, String> {
    uri.query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Fetch a required query parameter
fn require_param(uri: &Uri, name: &str) -> Result<String, MatchError> {
    query_map(uri)
        .remove(name)
        .ok_or_else(|| MatchError::InvalidInput(format!("Missing query parameter: {}", name)))
}

/// Split a comma-separated filter value
fn comma_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_segment() {
        assert_eq!(
            trim_segment("/api/projects/p-1/join", "/api/projects/", "/join"),
            "p-1"
        );
        assert_eq!(trim_segment("/api/projects/p-1", "/api/x/", "/join"), "");
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(
            comma_list(Some(&"Web, AI".to_string())),
            vec!["Web".to_string(), "AI".to_string()]
        );
        assert!(comma_list(None).is_empty());
    }

    #[test]
    fn test_query_map() {
        let uri: Uri = "/api/friends/status?userId=alice&otherId=bob"
            .parse()
            .unwrap();
        let params = query_map(&uri);
        assert_eq!(params.get("userId").map(String::as_str), Some("alice"));
        assert_eq!(params.get("otherId").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_decision_body_accepts_status_alias() {
        let body: DecisionBody =
            serde_json::from_str(r#"{"actorId":"u-1","status":"accepted"}"#).unwrap();
        assert_eq!(body.decision, "accepted");
        assert!(body.role.is_none());
    }
}
