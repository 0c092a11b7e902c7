use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Event, MovieRequest, RsvpStatus};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NewEventDto {
    #[serde(default)]
    pub catalog_url: String,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    pub capacity: Option<i64>,
    pub notes: Option<String>,
}

/// Partial edit. `None` keeps the stored value; an empty string for a catalog
/// field drops the manual override and restores the catalog value.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpdateEventDto {
    pub catalog_url: Option<String>,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn admin(expires_at: &DateTime<Utc>) -> Self {
        Self {
            sub: "admin".to_string(),
            exp: expires_at.timestamp() as usize,
        }
    }
}

/// Raw invite form: emails separated by commas, semicolons or newlines and
/// names one per line, paired with the sorted emails by position.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NewInvitesDto {
    #[serde(default)]
    pub emails: String,
    #[serde(default)]
    pub names: String,
}

#[derive(Debug, Serialize)]
pub struct InviteLink {
    pub invite_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct InviteBatch {
    pub created: usize,
    pub updated: usize,
    pub invites: Vec<InviteLink>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteRequestDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RsvpChoice {
    Attending,
    Declined,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RsvpDto {
    pub response: RsvpChoice,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RsvpOutcome {
    pub status: RsvpStatus,
    pub seat_number: Option<i64>,
    pub promoted: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InviteView {
    pub event: Event,
    pub guest_name: String,
    pub status: RsvpStatus,
    pub seat_number: Option<i64>,
    pub confirmed_count: i64,
    pub seats_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct RosterLine {
    pub invite_id: i64,
    pub display_name: String,
    pub email: String,
    pub approved: bool,
    pub status: RsvpStatus,
    pub seat_number: Option<i64>,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    pub event: Event,
    pub confirmed: i64,
    pub waitlisted: i64,
    pub declined: i64,
    pub seats_remaining: i64,
    pub roster: Vec<RosterLine>,
}

#[derive(Debug, Serialize)]
pub struct EventListing {
    pub upcoming: Vec<Event>,
    pub past: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub events: Vec<Event>,
    pub requests: Vec<MovieRequest>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NewMovieRequestDto {
    #[serde(default)]
    pub title: String,
    pub catalog_url: Option<String>,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
}

/// Event-creation result, carrying the catalog warning when metadata could not be loaded.
#[derive(Debug, Serialize)]
pub struct SavedEvent {
    pub event: Event,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedRequest {
    pub request: MovieRequest,
    pub warning: Option<String>,
}
