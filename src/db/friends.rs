//! Friend requests and friendship edges
//!
//! A friend request is directional; the friendship it produces is not. Each
//! unordered pair is stored once, with the lexically smaller user id in
//! `user_a_id`, so the pair uniqueness constraint needs no either-direction
//! query.

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::diesel_schema::{friend_requests, friendships};
use super::models::{
    current_timestamp, request_statuses, FriendRequest, Friendship, NewFriendRequest,
    NewFriendship,
};
use crate::error::MatchError;

/// Input for sending a friend request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFriendRequestInput {
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Canonical ordering for an unordered user pair
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Friend Requests
// ============================================================================

/// Get friend request by ID
pub fn get_friend_request(
    conn: &mut SqliteConnection,
    request_id: &str,
) -> Result<Option<FriendRequest>, MatchError> {
    friend_requests::table
        .filter(friend_requests::id.eq(request_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Get friend request by ID, failing when absent
pub fn require_friend_request(
    conn: &mut SqliteConnection,
    request_id: &str,
) -> Result<FriendRequest, MatchError> {
    get_friend_request(conn, request_id)?
        .ok_or_else(|| MatchError::NotFound(format!("Friend request {} not found", request_id)))
}

/// Check for a pending request between two users, in either direction
pub fn pending_request_exists(
    conn: &mut SqliteConnection,
    user_a: &str,
    user_b: &str,
) -> Result<bool, MatchError> {
    let count: i64 = friend_requests::table
        .filter(
            (friend_requests::from_user_id
                .eq(user_a)
                .and(friend_requests::to_user_id.eq(user_b)))
            .or(friend_requests::from_user_id
                .eq(user_b)
                .and(friend_requests::to_user_id.eq(user_a))),
        )
        .filter(friend_requests::status.eq(request_statuses::PENDING))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// List pending friend requests addressed to a user, newest first
pub fn list_pending_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<FriendRequest>, MatchError> {
    friend_requests::table
        .filter(friend_requests::to_user_id.eq(user_id))
        .filter(friend_requests::status.eq(request_statuses::PENDING))
        .order(friend_requests::created_at.desc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Create a pending friend request
pub fn insert_friend_request(
    conn: &mut SqliteConnection,
    input: &CreateFriendRequestInput,
) -> Result<FriendRequest, MatchError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_request = NewFriendRequest {
        id: &id,
        from_user_id: &input.from_user_id,
        to_user_id: &input.to_user_id,
        message: input.message.as_deref(),
        status: request_statuses::PENDING,
        created_at: &now,
    };

    diesel::insert_into(friend_requests::table)
        .values(&new_request)
        .execute(conn)?;

    require_friend_request(conn, &id)
}

/// Write a friend request's terminal status
pub fn resolve_friend_request(
    conn: &mut SqliteConnection,
    request_id: &str,
    status: &str,
) -> Result<FriendRequest, MatchError> {
    diesel::update(friend_requests::table.filter(friend_requests::id.eq(request_id)))
        .set(friend_requests::status.eq(status))
        .execute(conn)?;

    require_friend_request(conn, request_id)
}

// ============================================================================
// Friendships
// ============================================================================

/// Get the friendship between two users, if any
pub fn friendship_between(
    conn: &mut SqliteConnection,
    user_a: &str,
    user_b: &str,
) -> Result<Option<Friendship>, MatchError> {
    let (first, second) = canonical_pair(user_a, user_b);

    friendships::table
        .filter(friendships::user_a_id.eq(first))
        .filter(friendships::user_b_id.eq(second))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// List friendships involving a user, newest first
pub fn list_friendships_for(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<Friendship>, MatchError> {
    friendships::table
        .filter(
            friendships::user_a_id
                .eq(user_id)
                .or(friendships::user_b_id.eq(user_id)),
        )
        .order(friendships::created_at.desc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Create the friendship edge for a pair
pub fn insert_friendship(
    conn: &mut SqliteConnection,
    user_a: &str,
    user_b: &str,
) -> Result<Friendship, MatchError> {
    let (first, second) = canonical_pair(user_a, user_b);
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_friendship = NewFriendship {
        id: &id,
        user_a_id: first,
        user_b_id: second,
        created_at: &now,
    };

    diesel::insert_into(friendships::table)
        .values(&new_friendship)
        .execute(conn)?;

    friendship_between(conn, first, second)?
        .ok_or_else(|| MatchError::Internal("Failed to retrieve created friendship".into()))
}

/// Delete the friendship for a pair
pub fn delete_friendship(
    conn: &mut SqliteConnection,
    user_a: &str,
    user_b: &str,
) -> Result<bool, MatchError> {
    let (first, second) = canonical_pair(user_a, user_b);

    let deleted = diesel::delete(
        friendships::table
            .filter(friendships::user_a_id.eq(first))
            .filter(friendships::user_b_id.eq(second)),
    )
    .execute(conn)?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_orders_lexically() {
        assert_eq!(canonical_pair("bob", "alice"), ("alice", "bob"));
        assert_eq!(canonical_pair("alice", "bob"), ("alice", "bob"));
        assert_eq!(canonical_pair("same", "same"), ("same", "same"));
    }
}
