//! Notification service - the poll-based correlation log surface

use std::sync::Arc;

use crate::db::models::Notification;
use crate::db::{notifications, Db};
use crate::error::MatchError;

use super::events::{DomainEvent, EventBus};

/// Notification service
pub struct NotificationService {
    db: Arc<Db>,
    events: Arc<EventBus>,
}

impl NotificationService {
    /// Create a new notification service
    pub fn new(db: Arc<Db>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// List a user's notifications, most recent first. Clients derive their
    /// unread badge from the entries.
    pub fn list_for(&self, user_id: &str) -> Result<Vec<Notification>, MatchError> {
        self.db
            .with_conn(|conn| notifications::list_for_recipient(conn, user_id))
    }

    /// Count a user's unread notifications
    pub fn unread_count(&self, user_id: &str) -> Result<i64, MatchError> {
        self.db
            .with_conn(|conn| notifications::unread_count(conn, user_id))
    }

    /// Append a notification outside the request pipelines
    pub fn emit(
        &self,
        input: notifications::EmitNotificationInput,
    ) -> Result<Notification, MatchError> {
        let notification = self
            .db
            .transaction(|conn| notifications::insert_notification(conn, &input))?;

        self.events.emit(DomainEvent::NotificationEmitted {
            id: notification.id.clone(),
            recipient_id: notification.recipient_id.clone(),
        });

        Ok(notification)
    }

    /// Mark a notification read; recipient only. A second call is a no-op
    /// that returns the same read entry.
    pub fn mark_read(
        &self,
        notification_id: &str,
        actor_id: &str,
    ) -> Result<Notification, MatchError> {
        let (notification, was_unread) = self.db.transaction(|conn| {
            let existing = notifications::get_notification(conn, notification_id)?.ok_or_else(
                || MatchError::NotFound(format!("Notification {} not found", notification_id)),
            )?;

            if existing.recipient_id != actor_id {
                return Err(MatchError::Forbidden(
                    "Only the recipient may mark a notification read".into(),
                ));
            }

            let was_unread = existing.is_read == 0;
            let updated = notifications::mark_read(conn, notification_id)?;
            Ok((updated, was_unread))
        })?;

        if was_unread {
            self.events.emit(DomainEvent::NotificationRead {
                id: notification.id.clone(),
            });
        }

        Ok(notification)
    }
}
