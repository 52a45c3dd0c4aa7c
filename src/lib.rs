//! Matchboard - team matching for student collaboration projects
//!
//! Tracks role vacancies on projects and routes the three request flavors
//! (join applications, owner invitations, friend requests) through a shared
//! accept/decline lifecycle, correlating each with a notification the
//! addressed party can act on exactly once.
//!
//! ## Architecture
//!
//! ```text
//! HTTP Handlers (http.rs, thin)
//!     ↓
//! Service Layer (services/, business logic + lifecycle engine)
//!     ↓
//! Repository Layer (db/, Diesel over SQLite)
//! ```
//!
//! ## Consistency model
//!
//! Writes go through one connection behind a mutex, each lifecycle operation
//! inside one SQLite transaction. Resolving a request applies its side
//! effects (ledger claim, membership or friendship insert), flips the
//! correlated notification, and writes the terminal status as a unit: a
//! failure anywhere leaves the request pending and the notification unread.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod services;

// Re-exports
pub use config::Config;
pub use db::Db;
pub use error::MatchError;
pub use http::HttpServer;
pub use services::{
    Decision, DomainEvent, EventBus, FriendService, InvitationService, NotificationService,
    ProfileService, ProjectService, RequestKind, RequestRef, Services,
};
