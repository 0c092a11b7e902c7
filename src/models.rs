use bitflags::bitflags;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;

bitflags! {
    /// Metadata fields the host typed in by hand. Catalog refreshes leave these alone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MetadataOverrides: u8 {
        const TITLE = 1;
        const POSTER = 1 << 1;
        const SYNOPSIS = 1 << 2;
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub catalog_url: String,
    pub poster_url: Option<String>,
    pub synopsis: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub capacity: i64,
    pub notes: Option<String>,
    pub metadata_overrides: i64,
    #[serde(skip)]
    pub response_seq: i64,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn overrides(&self) -> MetadataOverrides {
        MetadataOverrides::from_bits_truncate(self.metadata_overrides as u8)
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Invite {
    pub id: i64,
    pub event_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    NoResponse,
    Confirmed,
    Waitlisted,
    Declined,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Rsvp {
    pub id: i64,
    pub invite_id: i64,
    pub event_id: i64,
    pub status: RsvpStatus,
    pub seat_number: Option<i64>,
    pub response_seq: i64,
    pub responded_at: DateTime<Utc>,
}

/// One invite joined with its RSVP row, if the guest has answered.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RosterEntry {
    pub invite_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
    pub approved: bool,
    pub status: Option<RsvpStatus>,
    pub seat_number: Option<i64>,
    pub response_seq: Option<i64>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl RosterEntry {
    pub fn status(&self) -> RsvpStatus {
        self.status.unwrap_or(RsvpStatus::NoResponse)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct MovieRequest {
    pub id: i64,
    pub title: String,
    pub catalog_url: Option<String>,
    pub poster_url: Option<String>,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
