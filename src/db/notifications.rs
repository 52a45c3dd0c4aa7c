//! Notification correlation log
//!
//! Append-only rows addressed to a recipient. `related_kind` + `related_id`
//! point back at the request that produced the entry. The only mutation ever
//! applied is the monotonic unread -> read flip.

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::diesel_schema::notifications;
use super::models::{current_timestamp, NewNotification, Notification};
use crate::error::MatchError;

/// Input for emitting a notification
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitNotificationInput {
    pub recipient_id: String,
    pub notif_type: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub related_kind: Option<String>,
    #[serde(default)]
    pub related_id: Option<String>,
}

/// Get notification by ID
pub fn get_notification(
    conn: &mut SqliteConnection,
    notification_id: &str,
) -> Result<Option<Notification>, MatchError> {
    notifications::table
        .filter(notifications::id.eq(notification_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// List a user's notifications, most recent first
pub fn list_for_recipient(
    conn: &mut SqliteConnection,
    recipient_id: &str,
) -> Result<Vec<Notification>, MatchError> {
    notifications::table
        .filter(notifications::recipient_id.eq(recipient_id))
        .order(notifications::timestamp.desc())
        .load(conn)
        .map_err(MatchError::from)
}

/// Count a user's unread notifications
pub fn unread_count(conn: &mut SqliteConnection, recipient_id: &str) -> Result<i64, MatchError> {
    notifications::table
        .filter(notifications::recipient_id.eq(recipient_id))
        .filter(notifications::is_read.eq(0))
        .count()
        .get_result(conn)
        .map_err(MatchError::from)
}

/// Append an unread notification
pub fn insert_notification(
    conn: &mut SqliteConnection,
    input: &EmitNotificationInput,
) -> Result<Notification, MatchError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_notification = NewNotification {
        id: &id,
        recipient_id: &input.recipient_id,
        notif_type: &input.notif_type,
        title: &input.title,
        message: &input.message,
        link: input.link.as_deref(),
        related_kind: input.related_kind.as_deref(),
        related_id: input.related_id.as_deref(),
        is_read: 0,
        timestamp: &now,
    };

    diesel::insert_into(notifications::table)
        .values(&new_notification)
        .execute(conn)?;

    get_notification(conn, &id)?
        .ok_or_else(|| MatchError::Internal("Failed to retrieve created notification".into()))
}

/// Flip one notification to read. Flipping an already-read entry is a no-op.
pub fn mark_read(
    conn: &mut SqliteConnection,
    notification_id: &str,
) -> Result<Notification, MatchError> {
    diesel::update(notifications::table.filter(notifications::id.eq(notification_id)))
        .set(notifications::is_read.eq(1))
        .execute(conn)?;

    get_notification(conn, notification_id)?
        .ok_or_else(|| MatchError::NotFound(format!("Notification {} not found", notification_id)))
}

/// Flip every notification addressed to `recipient_id` that correlates to the
/// given request reference
pub fn mark_related_read(
    conn: &mut SqliteConnection,
    recipient_id: &str,
    related_kind: &str,
    related_id: &str,
) -> Result<usize, MatchError> {
    diesel::update(
        notifications::table
            .filter(notifications::recipient_id.eq(recipient_id))
            .filter(notifications::related_kind.eq(related_kind))
            .filter(notifications::related_id.eq(related_id)),
    )
    .set(notifications::is_read.eq(1))
    .execute(conn)
    .map_err(MatchError::from)
}
