use std::collections::BTreeSet;

use chrono::Utc;
use log::info;

use crate::{
   config::Config,
   db,
   dto::{InviteBatch, InviteLink, InviteRequestDto, NewInvitesDto},
   errors::AppError,
   models::{Invite, RsvpStatus},
   service::{crypto::generate_token, rsvp},
   DbPool,
};

/// Lower-cased, de-duplicated, sorted addresses from a comma, semicolon or
/// newline separated list.
pub fn parse_emails(raw: &str) -> Vec<String> {
   raw.split(|c| c == ',' || c == ';' || c == '\n' || c == '\r')
      .map(|entry| entry.trim().to_lowercase())
      .filter(|entry| !entry.is_empty())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
}

pub fn parse_names(raw: &str) -> Vec<String> {
   raw.lines()
      .map(str::trim)
      .filter(|name| !name.is_empty())
      .map(str::to_string)
      .collect()
}

/// Creates one invite per address. Addresses already invited to the event get
/// the new name, and a fresh token as long as the guest has not answered yet.
/// Pending guest requests keep their token.
pub async fn create_invites(
   event_id: i64,
   dto: NewInvitesDto,
   config: &Config,
   pool: &DbPool,
) -> Result<InviteBatch, AppError> {
   let emails = parse_emails(&dto.emails);
   if emails.is_empty() {
      return Err(AppError::validation("enter at least one email address"));
   }
   let names = parse_names(&dto.names);

   let mut tx = pool.begin().await?;
   db::event::lock(event_id, &mut *tx)
      .await?
      .ok_or(AppError::NotFound)?;

   let mut created = 0;
   let mut updated = 0;
   let mut invites = Vec::with_capacity(emails.len());
   for (index, email) in emails.iter().enumerate() {
      let name = names.get(index).map(String::as_str);
      let invite_id = match db::invitations::get_by_event_and_email(event_id, email, &mut *tx).await? {
         Some(existing) => {
            if let Some(name) = name {
               db::invitations::set_name(existing.id, name, &mut *tx).await?;
            }
            let unanswered = db::rsvp::get_for_invite(existing.id, &mut *tx).await?.is_none();
            if existing.approved && unanswered {
               db::invitations::set_token(existing.id, &generate_token(), &mut *tx).await?;
            }
            updated += 1;
            existing.id
         }
         None => {
            created += 1;
            db::invitations::create(event_id, email, name, &generate_token(), true, Utc::now(), &mut *tx)
               .await?
         }
      };
      let invite = db::invitations::get_by_id(invite_id, &mut *tx)
         .await?
         .ok_or(AppError::InternalError)?;
      invites.push(invite_link(invite, config));
   }
   tx.commit().await?;

   info!("event {}: {} invites created, {} updated", event_id, created, updated);
   Ok(InviteBatch { created, updated, invites })
}

fn invite_link(invite: Invite, config: &Config) -> InviteLink {
   InviteLink {
      invite_id: invite.id,
      link: config.invite_link(&invite.token),
      email: invite.email,
      name: invite.name,
   }
}

/// A guest asks to be invited. The request waits for host approval before its
/// token can be used.
pub async fn request_invite(event_id: i64, dto: InviteRequestDto, pool: &DbPool) -> Result<(), AppError> {
   let name = dto.name.trim();
   let email = dto.email.trim().to_lowercase();
   if name.is_empty() || email.is_empty() {
      return Err(AppError::validation("name and email are required"));
   }

   let mut tx = pool.begin().await?;
   db::event::lock(event_id, &mut *tx)
      .await?
      .ok_or(AppError::NotFound)?;
   if db::invitations::get_by_event_and_email(event_id, &email, &mut *tx).await?.is_some() {
      return Err(AppError::validation(
         "an invite for this event was already requested or sent to this address",
      ));
   }
   db::invitations::create(event_id, &email, Some(name), &generate_token(), false, Utc::now(), &mut *tx)
      .await?;
   tx.commit().await?;
   info!("event {}: invite requested by {}", event_id, email);
   Ok(())
}

pub async fn approve(invite_id: i64, pool: &DbPool) -> Result<Invite, AppError> {
   if db::invitations::approve(invite_id, pool).await? == 0 {
      return Err(AppError::NotFound);
   }
   db::invitations::get_by_id(invite_id, pool)
      .await?
      .ok_or(AppError::NotFound)
}

/// Removes the invite. A seat it held goes to the head of the waitlist in the
/// same transaction.
pub async fn reject(invite_id: i64, pool: &DbPool) -> Result<(), AppError> {
   let mut tx = pool.begin().await?;
   let event_id = db::event::lock_for_invite(invite_id, &mut *tx)
      .await?
      .ok_or(AppError::NotFound)?;
   let event = db::event::get_by_id(event_id, &mut *tx)
      .await?
      .ok_or(AppError::NotFound)?;
   let held_seat = db::rsvp::get_for_invite(invite_id, &mut *tx)
      .await?
      .is_some_and(|r| r.status == RsvpStatus::Confirmed);

   db::invitations::delete(invite_id, &mut *tx).await?;
   let promoted = if held_seat {
      rsvp::promote_from_waitlist(&event, &mut tx).await?
   } else {
      Vec::new()
   };
   tx.commit().await?;
   info!("event {}: invite {} removed (promoted {})", event_id, invite_id, promoted.len());
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::db::{seed_event, seed_invite, test_pool};
   use futures_util::future::join_all;
   use crate::dto::RsvpChoice;
   use crate::service::rsvp;

   #[test]
   fn emails_are_normalized() {
      assert_eq!(
         parse_emails("B@example.com, a@example.com;\nb@example.com\r\n\n"),
         vec!["a@example.com".to_string(), "b@example.com".to_string()]
      );
      assert!(parse_emails(" , ;").is_empty());
   }

   #[actix_rt::test]
   async fn names_pair_with_sorted_emails() {
      let pool = test_pool().await;
      let event = seed_event(&pool, 4).await;
      let dto = NewInvitesDto {
         emails: "zoe@example.com\nada@example.com".to_string(),
         names: "Ada\nZoe".to_string(),
      };
      let batch = create_invites(event, dto, &Config::default(), &pool).await.unwrap();

      assert_eq!(batch.created, 2);
      assert_eq!(batch.invites[0].email, "ada@example.com");
      assert_eq!(batch.invites[0].name.as_deref(), Some("Ada"));
      assert_eq!(batch.invites[1].name.as_deref(), Some("Zoe"));
      assert!(batch.invites[0].link.starts_with("http://127.0.0.1:8080/invite/"));
   }

   #[actix_rt::test]
   async fn reinviting_rotates_token_only_before_an_answer() {
      let pool = test_pool().await;
      let config = Config::default();
      let event = seed_event(&pool, 4).await;
      let dto = || NewInvitesDto { emails: "a@example.com, b@example.com".to_string(), names: String::new() };

      let first = create_invites(event, dto(), &config, &pool).await.unwrap();
      let answered = db::invitations::get_by_id(first.invites[0].invite_id, &pool).await.unwrap().unwrap();
      rsvp::submit_response(&pool, event, &answered.token, RsvpChoice::Attending, None).await.unwrap();

      let second = create_invites(event, dto(), &config, &pool).await.unwrap();
      assert_eq!(second.created, 0);
      assert_eq!(second.updated, 2);
      assert_eq!(second.invites[0].link, first.invites[0].link);
      assert_ne!(second.invites[1].link, first.invites[1].link);
   }

   #[actix_rt::test]
   async fn invites_need_an_address_and_an_event() {
      let pool = test_pool().await;
      let config = Config::default();
      let res = create_invites(1, NewInvitesDto::default(), &config, &pool).await;
      assert!(matches!(res, Err(AppError::Validation(_))));

      let dto = NewInvitesDto { emails: "a@example.com".to_string(), names: String::new() };
      let res = create_invites(42, dto, &config, &pool).await;
      assert!(matches!(res, Err(AppError::NotFound)));
   }

   #[actix_rt::test]
   async fn requested_invite_is_usable_after_approval() {
      let pool = test_pool().await;
      let event = seed_event(&pool, 2).await;
      let dto = InviteRequestDto { name: "Walk In".to_string(), email: "Walk@Example.com".to_string() };
      request_invite(event, dto.clone(), &pool).await.unwrap();

      let duplicate = request_invite(event, dto, &pool).await;
      assert!(matches!(duplicate, Err(AppError::Validation(_))));

      let invite = db::invitations::get_by_event_and_email(event, "walk@example.com", &pool)
         .await
         .unwrap()
         .unwrap();
      assert!(!invite.approved);
      let denied = rsvp::submit_by_token(&pool, &invite.token, RsvpChoice::Attending, None).await;
      assert!(matches!(denied, Err(AppError::Validation(_))));

      assert!(approve(invite.id, &pool).await.unwrap().approved);
      let outcome = rsvp::submit_by_token(&pool, &invite.token, RsvpChoice::Attending, None).await.unwrap();
      assert_eq!(outcome.seat_number, Some(1));
   }

   #[actix_rt::test]
   async fn rejecting_removes_the_request() {
      let pool = test_pool().await;
      let event = seed_event(&pool, 2).await;
      let dto = InviteRequestDto { name: "Walk In".to_string(), email: "walk@example.com".to_string() };
      request_invite(event, dto, &pool).await.unwrap();
      let invite = db::invitations::get_by_event_and_email(event, "walk@example.com", &pool)
         .await
         .unwrap()
         .unwrap();

      reject(invite.id, &pool).await.unwrap();
      assert_eq!(reject(invite.id, &pool).await, Err(AppError::NotFound));
   }

   #[actix_rt::test]
   async fn rejecting_a_seated_guest_promotes_the_waitlist() {
      let pool = test_pool().await;
      let event = seed_event(&pool, 1).await;
      let seated = seed_invite(&pool, event, "a@example.com").await;
      let waiting = seed_invite(&pool, event, "b@example.com").await;
      rsvp::submit_response(&pool, event, &seated, RsvpChoice::Attending, None).await.unwrap();
      rsvp::submit_response(&pool, event, &waiting, RsvpChoice::Attending, None).await.unwrap();

      let invite = db::invitations::get_by_token(&seated, &pool).await.unwrap().unwrap();
      reject(invite.id, &pool).await.unwrap();

      let view = rsvp::view_invite(&pool, &waiting).await.unwrap();
      assert_eq!(view.status, RsvpStatus::Confirmed);
      assert_eq!(view.seat_number, Some(1));
      assert_eq!(view.seats_remaining, 0);
   }

   #[actix_rt::test]
   async fn reinviting_leaves_a_pending_request_token_alone() {
      let pool = test_pool().await;
      let event = seed_event(&pool, 2).await;
      let dto = InviteRequestDto { name: "Walk In".to_string(), email: "walk@example.com".to_string() };
      request_invite(event, dto, &pool).await.unwrap();
      let before = db::invitations::get_by_event_and_email(event, "walk@example.com", &pool)
         .await
         .unwrap()
         .unwrap();

      let dto = NewInvitesDto { emails: "walk@example.com".to_string(), names: String::new() };
      let batch = create_invites(event, dto, &Config::default(), &pool).await.unwrap();
      assert_eq!(batch.updated, 1);

      let after = db::invitations::get_by_id(before.id, &pool).await.unwrap().unwrap();
      assert_eq!(after.token, before.token);
      assert!(!after.approved);
   }

   #[actix_rt::test]
   async fn overlapping_invite_writes_all_land() {
      let dir = tempfile::tempdir().unwrap();
      let pool = db::file_test_pool(dir.path()).await;
      let event = seed_event(&pool, 4).await;
      let config = Config::default();

      let requests = (0..6).map(|n| {
         let dto = InviteRequestDto { name: format!("Guest {n}"), email: format!("guest{n}@example.com") };
         request_invite(event, dto, &pool)
      });
      let batch = create_invites(
         event,
         NewInvitesDto { emails: "host1@example.com, host2@example.com".to_string(), names: String::new() },
         &config,
         &pool,
      );
      let (requested, batch) = futures_util::join!(join_all(requests), batch);

      assert!(requested.iter().all(Result::is_ok));
      assert_eq!(batch.unwrap().created, 2);
      assert_eq!(db::rsvp::roster(event, &pool).await.unwrap().len(), 8);
   }
}
