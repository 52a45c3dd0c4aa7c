//! Profile service - the student directory

use std::sync::Arc;

use crate::db::models::Profile;
use crate::db::{profiles, Db};
use crate::error::MatchError;

use super::events::{DomainEvent, EventBus};

/// Profile service
pub struct ProfileService {
    db: Arc<Db>,
    events: Arc<EventBus>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(db: Arc<Db>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Get a user's profile
    pub fn get(&self, user_id: &str) -> Result<Profile, MatchError> {
        self.db.with_conn(|conn| {
            profiles::get_profile(conn, user_id)?
                .ok_or_else(|| MatchError::NotFound(format!("No profile for user {}", user_id)))
        })
    }

    /// List profiles with directory filters
    pub fn list(&self, query: &profiles::ProfileQuery) -> Result<Vec<Profile>, MatchError> {
        self.db.with_conn(|conn| profiles::list_profiles(conn, query))
    }

    /// Create or update a user's own profile
    pub fn upsert(
        &self,
        user_id: &str,
        input: profiles::UpsertProfileInput,
    ) -> Result<Profile, MatchError> {
        if user_id.trim().is_empty() {
            return Err(MatchError::InvalidInput("User is required".into()));
        }

        let profile = self
            .db
            .transaction(|conn| profiles::upsert_profile(conn, user_id, &input))?;

        self.events.emit(DomainEvent::ProfileUpdated {
            user_id: user_id.to_string(),
        });

        Ok(profile)
    }
}
