use chrono::Utc;
use log::info;

use crate::{
   db,
   dto::{NewMovieRequestDto, SavedRequest},
   errors::AppError,
   models::{MovieRequest, RequestStatus},
   service::{event::resolve_metadata, metadata::MetadataFetcher},
   DbPool,
};

/// Stores a film wish. A catalog link, when given, supplies the title and poster.
pub async fn create(
   dto: NewMovieRequestDto,
   fetcher: &MetadataFetcher,
   pool: &DbPool,
) -> Result<SavedRequest, AppError> {
   let title = dto.title.trim();
   if title.is_empty() {
      return Err(AppError::validation("title is required"));
   }
   let optional = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

   let mut request = MovieRequest {
      id: 0,
      title: title.to_string(),
      catalog_url: None,
      poster_url: None,
      requester_name: optional(dto.requester_name),
      requester_email: optional(dto.requester_email),
      status: RequestStatus::Pending,
      created_at: Utc::now(),
   };

   let mut warning = None;
   if let Some(url) = optional(dto.catalog_url) {
      let resolved = resolve_metadata(fetcher, &url).await;
      if let Some(metadata) = resolved.metadata {
         if let Some(title) = metadata.title {
            request.title = title;
         }
         request.poster_url = metadata.poster_url;
      }
      request.catalog_url = Some(resolved.url);
      warning = resolved.warning;
   }

   request.id = db::requests::create(&request, pool).await?;
   info!("movie request {} for '{}'", request.id, request.title);
   Ok(SavedRequest { request, warning })
}

pub async fn get_all(pool: &DbPool) -> Result<Vec<MovieRequest>, AppError> {
   Ok(db::requests::get_all(pool).await?)
}

pub async fn set_status(id: i64, status: RequestStatus, pool: &DbPool) -> Result<(), AppError> {
   match db::requests::set_status(id, status, pool).await? {
      0 => Err(AppError::NotFound),
      _ => Ok(()),
   }
}
