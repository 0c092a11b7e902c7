use chrono::{DateTime, Timelike, Utc};
use log::{info, warn};

use crate::{
   config::Config,
   db,
   dto::{Dashboard, EventDetails, EventListing, NewEventDto, RosterLine, SavedEvent, UpdateEventDto},
   errors::AppError,
   models::{Event, MetadataOverrides, RsvpStatus},
   service::{
      metadata::{CatalogMetadata, MetadataFetcher},
      rsvp,
   },
   DbPool,
};

const UNTITLED: &str = "Untitled";
const PAST_EVENTS_SHOWN: usize = 3;

pub struct ResolvedCatalog {
   pub url: String,
   pub metadata: Option<CatalogMetadata>,
   pub warning: Option<String>,
}

/// Fetches catalog metadata, degrading to the URL alone when that fails.
pub async fn resolve_metadata(fetcher: &MetadataFetcher, raw_url: &str) -> ResolvedCatalog {
   match fetcher.fetch(raw_url).await {
      Ok(metadata) => ResolvedCatalog {
         url: metadata.canonical_url.clone(),
         metadata: Some(metadata),
         warning: None,
      },
      Err(err) => {
         warn!("catalog metadata for {} unavailable: {}", raw_url, err);
         ResolvedCatalog {
            url: fetcher
               .normalize_url(raw_url)
               .unwrap_or_else(|_| raw_url.trim().to_string()),
            metadata: None,
            warning: Some(format!("catalog metadata could not be loaded: {err}")),
         }
      }
   }
}

/// Copies catalog values into every field the host has not overridden.
pub fn apply_catalog(event: &mut Event, metadata: &CatalogMetadata) {
   let overrides = event.overrides();
   event.catalog_url = metadata.canonical_url.clone();
   if !overrides.contains(MetadataOverrides::TITLE) {
      if let Some(title) = &metadata.title {
         event.title = title.clone();
      }
   }
   if !overrides.contains(MetadataOverrides::SYNOPSIS) && metadata.synopsis.is_some() {
      event.synopsis = metadata.synopsis.clone();
   }
   if !overrides.contains(MetadataOverrides::POSTER) && metadata.poster_url.is_some() {
      event.poster_url = metadata.poster_url.clone();
   }
}

fn non_empty(value: Option<&str>) -> Option<String> {
   value.and_then(trimmed)
}

fn trimmed(value: &str) -> Option<String> {
   Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn validate_capacity(capacity: Option<i64>) -> Result<i64, AppError> {
   match capacity {
      Some(c) if c > 0 => Ok(c),
      _ => Err(AppError::validation("capacity must be at least 1")),
   }
}

fn normalize_start(starts_at: DateTime<Utc>) -> DateTime<Utc> {
   starts_at.with_nanosecond(0).unwrap_or(starts_at)
}

pub async fn create(dto: NewEventDto, fetcher: &MetadataFetcher, pool: &DbPool) -> Result<SavedEvent, AppError> {
   let catalog_url = trimmed(&dto.catalog_url);
   let location = trimmed(&dto.location);
   let (Some(catalog_url), Some(starts_at), Some(location)) = (catalog_url, dto.starts_at, location) else {
      return Err(AppError::validation("catalog URL, start time and location are required"));
   };
   let capacity = validate_capacity(dto.capacity)?;

   let title = non_empty(dto.title.as_deref());
   let synopsis = non_empty(dto.synopsis.as_deref());
   let poster_url = non_empty(dto.poster_url.as_deref());
   let mut overrides = MetadataOverrides::empty();
   overrides.set(MetadataOverrides::TITLE, title.is_some());
   overrides.set(MetadataOverrides::SYNOPSIS, synopsis.is_some());
   overrides.set(MetadataOverrides::POSTER, poster_url.is_some());

   let resolved = resolve_metadata(fetcher, &catalog_url).await;
   let mut event = Event {
      id: 0,
      title: title.unwrap_or_else(|| UNTITLED.to_string()),
      catalog_url: resolved.url.clone(),
      poster_url,
      synopsis,
      starts_at: normalize_start(starts_at),
      location,
      capacity,
      notes: non_empty(dto.notes.as_deref()),
      metadata_overrides: overrides.bits() as i64,
      response_seq: 0,
      created_at: Utc::now(),
   };
   if let Some(metadata) = &resolved.metadata {
      apply_catalog(&mut event, metadata);
   }

   let id = db::event::create(&event, pool).await?;
   info!("created event {} '{}' with {} seats", id, event.title, event.capacity);
   let event = db::event::get_by_id(id, pool).await?.ok_or(AppError::InternalError)?;
   Ok(SavedEvent { event, warning: resolved.warning })
}

pub async fn update(
   id: i64,
   dto: UpdateEventDto,
   fetcher: &MetadataFetcher,
   pool: &DbPool,
) -> Result<SavedEvent, AppError> {
   let mut event = get_by_id(id, pool).await?;
   let mut overrides = event.overrides();
   let mut needs_catalog = false;

   if let Some(raw) = &dto.catalog_url {
      let url = trimmed(raw).ok_or_else(|| AppError::validation("catalog URL is required"))?;
      needs_catalog |= url != event.catalog_url;
      event.catalog_url = url;
   }
   if let Some(raw) = &dto.location {
      event.location = trimmed(raw).ok_or_else(|| AppError::validation("location is required"))?;
   }
   if dto.capacity.is_some() {
      event.capacity = validate_capacity(dto.capacity)?;
   }
   if let Some(starts_at) = dto.starts_at {
      event.starts_at = normalize_start(starts_at);
   }
   if let Some(notes) = &dto.notes {
      event.notes = trimmed(notes);
   }

   if let Some(raw) = &dto.title {
      match trimmed(raw) {
         Some(title) => {
            event.title = title;
            overrides.insert(MetadataOverrides::TITLE);
         }
         None => {
            overrides.remove(MetadataOverrides::TITLE);
            needs_catalog = true;
         }
      }
   }
   if let Some(raw) = &dto.synopsis {
      match trimmed(raw) {
         Some(synopsis) => {
            event.synopsis = Some(synopsis);
            overrides.insert(MetadataOverrides::SYNOPSIS);
         }
         None => {
            overrides.remove(MetadataOverrides::SYNOPSIS);
            needs_catalog = true;
         }
      }
   }
   if let Some(raw) = &dto.poster_url {
      match trimmed(raw) {
         Some(poster_url) => {
            event.poster_url = Some(poster_url);
            overrides.insert(MetadataOverrides::POSTER);
         }
         None => {
            overrides.remove(MetadataOverrides::POSTER);
            needs_catalog = true;
         }
      }
   }
   event.metadata_overrides = overrides.bits() as i64;

   let mut warning = None;
   if needs_catalog {
      let resolved = resolve_metadata(fetcher, &event.catalog_url).await;
      event.catalog_url = resolved.url;
      if let Some(metadata) = &resolved.metadata {
         apply_catalog(&mut event, metadata);
      }
      warning = resolved.warning;
   }

   save_with_capacity_check(&event, pool).await?;
   let event = get_by_id(id, pool).await?;
   Ok(SavedEvent { event, warning })
}

/// Writes the event, then checks the new capacity against confirmed guests,
/// pulls seat numbers back inside the capacity and fills any new seats from
/// the waitlist, all in one transaction.
async fn save_with_capacity_check(event: &Event, pool: &DbPool) -> Result<(), AppError> {
   let mut tx = pool.begin().await?;
   if db::event::update(event, &mut *tx).await? == 0 {
      return Err(AppError::NotFound);
   }
   let confirmed = db::rsvp::count_by_status(event.id, RsvpStatus::Confirmed, &mut *tx).await?;
   if confirmed > event.capacity {
      return Err(AppError::validation(format!(
         "capacity cannot drop below the {confirmed} confirmed guests"
      )));
   }
   rsvp::reseat_within_capacity(event, &mut tx).await?;
   let promoted = rsvp::promote_from_waitlist(event, &mut tx).await?;
   tx.commit().await?;
   info!("updated event {} (promoted {} from the waitlist)", event.id, promoted.len());
   Ok(())
}

pub async fn refresh_metadata(id: i64, fetcher: &MetadataFetcher, pool: &DbPool) -> Result<Event, AppError> {
   let mut event = get_by_id(id, pool).await?;
   let metadata = fetcher
      .fetch(&event.catalog_url)
      .await
      .map_err(|e| AppError::validation(format!("catalog metadata could not be loaded: {e}")))?;
   apply_catalog(&mut event, &metadata);
   db::event::update(&event, pool).await?;
   get_by_id(id, pool).await
}

pub async fn delete(id: i64, pool: &DbPool) -> Result<(), AppError> {
   match db::event::delete(id, pool).await? {
      0 => Err(AppError::NotFound),
      _ => {
         info!("deleted event {}", id);
         Ok(())
      }
   }
}

pub async fn get_by_id(id: i64, pool: &DbPool) -> Result<Event, AppError> {
   db::event::get_by_id(id, pool).await?.ok_or(AppError::NotFound)
}

/// Upcoming events soonest first, plus the few most recent past ones.
pub async fn listing(now: DateTime<Utc>, pool: &DbPool) -> Result<EventListing, AppError> {
   let (upcoming, mut past): (Vec<Event>, Vec<Event>) = db::event::get_all(pool)
      .await?
      .into_iter()
      .partition(|event| event.starts_at >= now);
   past.reverse();
   past.truncate(PAST_EVENTS_SHOWN);
   Ok(EventListing { upcoming, past })
}

pub async fn dashboard(pool: &DbPool) -> Result<Dashboard, AppError> {
   let mut events = db::event::get_all(pool).await?;
   events.reverse();
   let requests = db::requests::get_all(pool).await?;
   Ok(Dashboard { events, requests })
}

pub async fn details(id: i64, config: &Config, pool: &DbPool) -> Result<EventDetails, AppError> {
   let event = get_by_id(id, pool).await?;
   let roster: Vec<RosterLine> = db::rsvp::roster(id, pool)
      .await?
      .into_iter()
      .map(|entry| RosterLine {
         invite_id: entry.invite_id,
         display_name: entry.display_name().to_string(),
         status: entry.status(),
         link: config.invite_link(&entry.token),
         email: entry.email,
         approved: entry.approved,
         seat_number: entry.seat_number,
      })
      .collect();

   let count = |status: RsvpStatus| roster.iter().filter(|line| line.status == status).count() as i64;
   let confirmed = count(RsvpStatus::Confirmed);
   let waitlisted = count(RsvpStatus::Waitlisted);
   let declined = count(RsvpStatus::Declined);

   Ok(EventDetails {
      seats_remaining: (event.capacity - confirmed).max(0),
      event,
      confirmed,
      waitlisted,
      declined,
      roster,
   })
}
