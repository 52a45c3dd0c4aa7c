//! Student profile directory
//!
//! One row per user. Credential records live elsewhere; this is the public
//! directory surface used for browsing candidates.

use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::profiles;
use super::models::{current_timestamp, NewProfile, Profile};
use crate::error::MatchError;

/// Input for creating or updating a profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileInput {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub primary_role: Option<String>,
    #[serde(default)]
    pub other_roles: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<serde_json::Value>,
    #[serde(default)]
    pub interest_domains: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<serde_json::Value>,
}

/// Query parameters for the profile directory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub college: Option<String>,
    /// Substring match, case-insensitive
    pub major: Option<String>,
    pub primary_role: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            college: None,
            major: None,
            primary_role: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    100
}

/// Get profile by user ID
pub fn get_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<Profile>, MatchError> {
    profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first(conn)
        .optional()
        .map_err(MatchError::from)
}

/// Name shown in notification text: profile display name when present,
/// the raw user id otherwise
pub fn display_name(conn: &mut SqliteConnection, user_id: &str) -> Result<String, MatchError> {
    let profile = get_profile(conn, user_id)?;
    Ok(profile
        .and_then(|p| p.display_name)
        .unwrap_or_else(|| user_id.to_string()))
}

/// List profiles with directory filters
pub fn list_profiles(
    conn: &mut SqliteConnection,
    query: &ProfileQuery,
) -> Result<Vec<Profile>, MatchError> {
    let mut base_query = profiles::table.into_boxed();

    if let Some(ref college) = query.college {
        base_query = base_query.filter(profiles::college.eq(college));
    }

    if let Some(ref major) = query.major {
        base_query = base_query.filter(profiles::major.like(format!("%{}%", major)));
    }

    if let Some(ref role) = query.primary_role {
        base_query = base_query.filter(profiles::primary_role.eq(role));
    }

    base_query
        .order(profiles::updated_at.desc())
        .limit(query.limit)
        .offset(query.offset)
        .load(conn)
        .map_err(MatchError::from)
}

/// Create or update a user's profile. Absent input fields leave existing
/// values untouched on update.
pub fn upsert_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
    input: &UpsertProfileInput,
) -> Result<Profile, MatchError> {
    let now = current_timestamp();

    let other_roles_json = match &input.other_roles {
        Some(roles) => Some(serde_json::to_string(roles)?),
        None => None,
    };
    let skills_json = match &input.skills {
        Some(skills) => Some(serde_json::to_string(skills)?),
        None => None,
    };
    let interest_domains_json = match &input.interest_domains {
        Some(domains) => Some(serde_json::to_string(domains)?),
        None => None,
    };
    let links_json = match &input.links {
        Some(links) => Some(serde_json::to_string(links)?),
        None => None,
    };

    match get_profile(conn, user_id)? {
        Some(existing) => {
            diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
                .set((
                    profiles::display_name
                        .eq(input.display_name.clone().or(existing.display_name)),
                    profiles::college.eq(input.college.clone().or(existing.college)),
                    profiles::major.eq(input.major.clone().or(existing.major)),
                    profiles::bio.eq(input.bio.clone().or(existing.bio)),
                    profiles::primary_role
                        .eq(input.primary_role.clone().or(existing.primary_role)),
                    profiles::other_roles_json
                        .eq(other_roles_json.unwrap_or(existing.other_roles_json)),
                    profiles::skills_json.eq(skills_json.unwrap_or(existing.skills_json)),
                    profiles::interest_domains_json
                        .eq(interest_domains_json.unwrap_or(existing.interest_domains_json)),
                    profiles::links_json.eq(links_json.unwrap_or(existing.links_json)),
                    profiles::updated_at.eq(&now),
                ))
                .execute(conn)?;
        }
        None => {
            let new_profile = NewProfile {
                user_id,
                display_name: input.display_name.as_deref(),
                college: input.college.as_deref(),
                major: input.major.as_deref(),
                bio: input.bio.as_deref(),
                primary_role: input.primary_role.as_deref(),
                other_roles_json: other_roles_json.as_deref().unwrap_or("[]"),
                skills_json: skills_json.as_deref().unwrap_or("[]"),
                interest_domains_json: interest_domains_json.as_deref().unwrap_or("[]"),
                links_json: links_json.as_deref().unwrap_or("{}"),
                created_at: &now,
                updated_at: &now,
            };

            diesel::insert_into(profiles::table)
                .values(&new_profile)
                .execute(conn)?;
        }
    }

    get_profile(conn, user_id)?
        .ok_or_else(|| MatchError::Internal("Failed to retrieve profile".into()))
}
