//! SQLite database module for matchboard
//!
//! ## Architecture
//!
//! - Project aggregate (project, roles ledger, members, applications) in SQLite
//! - Invitations, friend requests, friendships, notifications as standalone records
//! - One writer connection behind a mutex: every request-lifecycle operation runs
//!   as a single transaction with no interleaving writes on the same aggregate
//!
//! ## Tables
//!
//! - `projects`, `project_roles`, `project_members`, `project_applications`
//! - `invitations`, `friend_requests`, `friendships`
//! - `notifications`, `profiles`

pub mod diesel_schema;
pub mod friends;
pub mod invitations;
pub mod models;
pub mod notifications;
pub mod profiles;
pub mod projects;
pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info};

use crate::error::MatchError;

/// SQLite database handle
pub struct Db {
    conn: Mutex<SqliteConnection>,
}

impl Db {
    /// Open or create the database
    pub fn open(data_dir: &Path) -> Result<Self, MatchError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("matchboard.db");
        info!("Opening SQLite database at {:?}", db_path);

        let mut conn = SqliteConnection::establish(&db_path.to_string_lossy())?;

        // WAL for concurrent readers, busy timeout so a second process backs off
        conn.batch_execute(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000; PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| MatchError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, MatchError> {
        debug!("Opening in-memory SQLite database");

        let mut conn = SqliteConnection::establish(":memory:")?;
        conn.batch_execute("PRAGMA foreign_keys=ON;")
            .map_err(|e| MatchError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), MatchError> {
        self.with_conn(schema::init_schema)
    }

    /// Run a read operation against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MatchError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, MatchError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MatchError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Run a write operation as a single immediate transaction.
    ///
    /// Any error returned by the closure rolls back every statement it ran, so
    /// a failed commit leaves requests pending and notifications unread.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, MatchError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, MatchError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MatchError::Internal(format!("Lock poisoned: {}", e)))?;
        conn.immediate_transaction(f)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, MatchError> {
        self.with_conn(|conn| {
            use diesel_schema::{
                friend_requests, friendships, invitations, notifications, project_applications,
                projects,
            };

            let project_count: i64 = projects::table.count().get_result(conn)?;
            let application_count: i64 = project_applications::table.count().get_result(conn)?;
            let invitation_count: i64 = invitations::table.count().get_result(conn)?;
            let friend_request_count: i64 = friend_requests::table.count().get_result(conn)?;
            let friendship_count: i64 = friendships::table.count().get_result(conn)?;
            let notification_count: i64 = notifications::table.count().get_result(conn)?;

            Ok(DbStats {
                project_count: project_count as u64,
                application_count: application_count as u64,
                invitation_count: invitation_count as u64,
                friend_request_count: friend_request_count as u64,
                friendship_count: friendship_count as u64,
                notification_count: notification_count as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    pub project_count: u64,
    pub application_count: u64,
    pub invitation_count: u64,
    pub friend_request_count: u64,
    pub friendship_count: u64,
    pub notification_count: u64,
}

// Re-exports
pub use models::{
    Application, FriendRequest, Friendship, Invitation, Notification, Profile, Project,
    ProjectMember, ProjectRole,
};
