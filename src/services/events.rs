//! Event system for matching operations
//!
//! Provides an event bus for notifying listeners about domain mutations.
//! Useful for:
//! - Audit logging
//! - Cache invalidation
//! - Sync triggers

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Domain events emitted by services
#[derive(Debug, Clone)]
pub enum DomainEvent {
    // Project events
    ProjectCreated {
        id: String,
        title: String,
        owner_id: String,
    },
    ProjectStatusChanged {
        id: String,
        status: String,
    },
    ProjectTerminated {
        id: String,
    },
    MemberJoined {
        project_id: String,
        user_id: String,
        role: String,
    },
    MemberLeft {
        project_id: String,
        user_id: String,
    },

    // Application events
    ApplicationSubmitted {
        id: String,
        project_id: String,
        applicant_id: String,
    },
    ApplicationDecided {
        id: String,
        project_id: String,
        status: String,
    },

    // Invitation events
    InvitationSent {
        id: String,
        project_id: String,
        to_user_id: String,
    },
    InvitationDecided {
        id: String,
        status: String,
    },

    // Friend events
    FriendRequestSent {
        id: String,
        from_user_id: String,
        to_user_id: String,
    },
    FriendRequestDecided {
        id: String,
        status: String,
    },
    FriendshipRemoved {
        user_a_id: String,
        user_b_id: String,
    },

    // Notification events
    NotificationEmitted {
        id: String,
        recipient_id: String,
    },
    NotificationRead {
        id: String,
    },

    // Profile events
    ProfileUpdated {
        user_id: String,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &DomainEvent);
}

/// Event bus for broadcasting domain events
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: DomainEvent) {
        trace!(event = ?event, "Emitting domain event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &DomainEvent) {
        match event {
            DomainEvent::ProjectCreated { id, title, owner_id } => {
                debug!(id = %id, title = %title, owner = %owner_id, "Project created");
            }
            DomainEvent::MemberJoined {
                project_id,
                user_id,
                role,
            } => {
                debug!(project = %project_id, user = %user_id, role = %role, "Member joined");
            }
            DomainEvent::ApplicationDecided {
                id,
                project_id,
                status,
            } => {
                debug!(id = %id, project = %project_id, status = %status, "Application decided");
            }
            DomainEvent::InvitationDecided { id, status } => {
                debug!(id = %id, status = %status, "Invitation decided");
            }
            DomainEvent::FriendRequestDecided { id, status } => {
                debug!(id = %id, status = %status, "Friend request decided");
            }
            _ => {
                trace!(event = ?event, "Domain event");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(DomainEvent::ProjectCreated {
            id: "p-1".into(),
            title: "Capstone".into(),
            owner_id: "owner-1".into(),
        });

        let event = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .expect("timeout")
            .expect("receive error");

        match event {
            DomainEvent::ProjectCreated { id, title, .. } => {
                assert_eq!(id, "p-1");
                assert_eq!(title, "Capstone");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_event_bus_no_subscribers() {
        let bus = EventBus::new();
        // Should not panic even with no subscribers
        bus.emit(DomainEvent::ProjectTerminated { id: "p-1".into() });
    }
}
