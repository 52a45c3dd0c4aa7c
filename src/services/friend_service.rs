//! Friend service - the symmetric peer-to-peer pipeline
//!
//! Requests are deduplicated across both directions of a pair; acceptance
//! produces exactly one friendship edge. No ledger is involved.

use std::sync::Arc;

use diesel::sqlite::SqliteConnection;

use crate::db::models::{request_statuses, FriendRequest, Friendship};
use crate::db::{friends, profiles, Db};
use crate::error::MatchError;

use super::events::{DomainEvent, EventBus};
use super::lifecycle::{
    self, Decision, PendingRequest, RequestKind, RequestPipeline, RequestRef, Resolution,
};

/// Pairwise relationship status
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendStatus {
    None,
    Pending,
    Friends,
}

/// Friend-request flavor of the request lifecycle
pub struct FriendRequestPipeline;

impl RequestPipeline for FriendRequestPipeline {
    fn kind(&self) -> RequestKind {
        RequestKind::FriendRequest
    }

    fn load(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> Result<PendingRequest, MatchError> {
        let request = friends::require_friend_request(conn, request_id)?;

        Ok(PendingRequest {
            reference: RequestRef::new(RequestKind::FriendRequest, request_id),
            responder: request.to_user_id,
            pending: request_statuses::is_pending(&request.status),
        })
    }

    fn commit(
        &self,
        conn: &mut SqliteConnection,
        request_id: &str,
        _role_override: Option<&str>,
    ) -> Result<Option<String>, MatchError> {
        let request = friends::require_friend_request(conn, request_id)?;

        if friends::friendship_between(conn, &request.from_user_id, &request.to_user_id)?
            .is_some()
        {
            return Err(MatchError::AlreadyFriends);
        }

        friends::insert_friendship(conn, &request.from_user_id, &request.to_user_id)?;

        Ok(None)
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
        friends::resolve_friend_request(conn, request_id, status)?;
        Ok(status.to_string())
    }
}

/// Friend service
pub struct FriendService {
    db: Arc<Db>,
    events: Arc<EventBus>,
}

impl FriendService {
    /// Create a new friend service
    pub fn new(db: Arc<Db>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// List a user's friendships
    pub fn friendships_of(&self, user_id: &str) -> Result<Vec<Friendship>, MatchError> {
        self.db
            .with_conn(|conn| friends::list_friendships_for(conn, user_id))
    }

    /// List pending friend requests addressed to a user
    pub fn pending_requests_for(&self, user_id: &str) -> Result<Vec<FriendRequest>, MatchError> {
        self.db
            .with_conn(|conn| friends::list_pending_for_user(conn, user_id))
    }

    /// Pairwise status between two users
    pub fn friend_status(&self, user_id: &str, other_id: &str) -> Result<FriendStatus, MatchError> {
        self.db.with_conn(|conn| {
            if friends::friendship_between(conn, user_id, other_id)?.is_some() {
                return Ok(FriendStatus::Friends);
            }
            if friends::pending_request_exists(conn, user_id, other_id)? {
                return Ok(FriendStatus::Pending);
            }
            Ok(FriendStatus::None)
        })
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Send a friend request and notify the addressed user
    pub fn send_request(
        &self,
        input: friends::CreateFriendRequestInput,
    ) -> Result<FriendRequest, MatchError> {
        lifecycle::ensure_distinct(&input.from_user_id, &input.to_user_id)?;

        let request = self.db.transaction(|conn| {
            if friends::friendship_between(conn, &input.from_user_id, &input.to_user_id)?
                .is_some()
            {
                return Err(MatchError::AlreadyFriends);
            }

            // Either direction counts: two users can hold at most one pending
            // request between them
            if friends::pending_request_exists(conn, &input.from_user_id, &input.to_user_id)? {
                return Err(MatchError::DuplicatePending(format!(
                    "A friend request between {} and {} is already pending",
                    input.from_user_id, input.to_user_id
                )));
            }

            let request = friends::insert_friend_request(conn, &input)?;

            let sender_name = profiles::display_name(conn, &input.from_user_id)?;
            lifecycle::notify_created(
                conn,
                &RequestRef::new(RequestKind::FriendRequest, request.id.clone()),
                &input.to_user_id,
                "Friend Request",
                &format!("{} sent you a friend request.", sender_name),
                None,
            )?;

            Ok(request)
        })?;

        self.events.emit(DomainEvent::FriendRequestSent {
            id: request.id.clone(),
            from_user_id: request.from_user_id.clone(),
            to_user_id: request.to_user_id.clone(),
        });

        Ok(request)
    }

    /// Resolve a friend request; addressed user only
    pub fn respond(
        &self,
        request_id: &str,
        actor_id: &str,
        decision: &str,
    ) -> Result<Resolution, MatchError> {
        let decision = Decision::parse(decision)?;

        let resolution = self.db.transaction(|conn| {
            lifecycle::respond(conn, &FriendRequestPipeline, actor_id, request_id, decision, None)
        })?;

        self.events.emit(DomainEvent::FriendRequestDecided {
            id: request_id.to_string(),
            status: resolution.status.clone(),
        });

        Ok(resolution)
    }

    /// Remove a friendship; either member may do so
    pub fn remove_friendship(&self, actor_id: &str, other_id: &str) -> Result<(), MatchError> {
        lifecycle::ensure_distinct(actor_id, other_id)?;

        self.db.transaction(|conn| {
            if !friends::delete_friendship(conn, actor_id, other_id)? {
                return Err(MatchError::NotFound(format!(
                    "No friendship between {} and {}",
                    actor_id, other_id
                )));
            }
            Ok(())
        })?;

        let (a, b) = friends::canonical_pair(actor_id, other_id);
        self.events.emit(DomainEvent::FriendshipRemoved {
            user_a_id: a.to_string(),
            user_b_id: b.to_string(),
        });

        Ok(())
    }
}
