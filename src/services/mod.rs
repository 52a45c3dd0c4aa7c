//! Service layer for matchboard
//!
//! Services encapsulate business logic between HTTP handlers and repositories.
//! Each service wraps database operations with:
//! - Input validation
//! - Request lifecycle transitions (via the shared engine)
//! - Event emission
//! - Transaction boundaries
//!
//! ## Architecture
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Service Layer (business logic)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod events;
pub mod friend_service;
pub mod invitation_service;
pub mod lifecycle;
pub mod notification_service;
pub mod profile_service;
pub mod project_service;
pub mod response;

// Re-exports
pub use events::{DomainEvent, EventBus, EventListener};
pub use friend_service::{FriendService, FriendStatus};
pub use invitation_service::InvitationService;
pub use lifecycle::{Decision, RequestKind, RequestRef, Resolution};
pub use notification_service::NotificationService;
pub use profile_service::ProfileService;
pub use project_service::{ProjectDetail, ProjectService};

use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;

/// Service container for dependency injection
///
/// Holds all services with the shared database handle.
/// Pass this to HttpServer for handler access.
pub struct Services {
    pub project: Arc<ProjectService>,
    pub invitation: Arc<InvitationService>,
    pub friend: Arc<FriendService>,
    pub notification: Arc<NotificationService>,
    pub profile: Arc<ProfileService>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all services with a shared database
    pub fn new(db: Arc<Db>, config: &Config) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            project: Arc::new(ProjectService::new(
                db.clone(),
                events.clone(),
                config.fallback_role.clone(),
                config.default_owner_role.clone(),
            )),
            invitation: Arc::new(InvitationService::new(
                db.clone(),
                events.clone(),
                config.fallback_role.clone(),
            )),
            friend: Arc::new(FriendService::new(db.clone(), events.clone())),
            notification: Arc::new(NotificationService::new(db.clone(), events.clone())),
            profile: Arc::new(ProfileService::new(db, events.clone())),
            events,
        }
    }
}
