//! Seat allocation for guest responses.
//!
//! Every submission runs in one transaction that starts by bumping the event's
//! response counter. That write takes the database write lock before anything
//! is read, so the capacity check, the status change and any waitlist
//! promotion see a stable view and commit together. The counter value doubles
//! as the waitlist ordering key.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::info;
use sqlx::SqliteConnection;

use crate::{
    db,
    dto::{InviteView, RsvpChoice, RsvpOutcome},
    errors::AppError,
    models::{Event, Invite, Rsvp, RsvpStatus},
    DbPool,
};

pub async fn submit_response(
    pool: &DbPool,
    event_id: i64,
    token: &str,
    choice: RsvpChoice,
    name: Option<&str>,
) -> Result<RsvpOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let response_seq = db::event::next_response_seq(event_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;
    let event = db::event::get_by_id(event_id, &mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;
    let invite = db::invitations::get_by_token(token, &mut *tx)
        .await?
        .ok_or_else(|| AppError::validation("unknown invite token"))?;
    if invite.event_id != event.id {
        return Err(AppError::validation("this invite belongs to a different event"));
    }
    if !invite.approved {
        return Err(AppError::validation("this invite request has not been approved yet"));
    }

    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        db::invitations::set_name(invite.id, name, &mut *tx).await?;
    }

    let outcome = apply_response(&event, &invite, choice, response_seq, Utc::now(), &mut tx).await?;
    tx.commit().await?;

    info!(
        "event {} invite {} answered {:?} -> {:?} (promoted {})",
        event.id,
        invite.id,
        choice,
        outcome.status,
        outcome.promoted.len()
    );
    Ok(outcome)
}

/// Same as [`submit_response`] for links that only carry the token.
pub async fn submit_by_token(
    pool: &DbPool,
    token: &str,
    choice: RsvpChoice,
    name: Option<&str>,
) -> Result<RsvpOutcome, AppError> {
    let invite = db::invitations::get_by_token(token, pool)
        .await?
        .ok_or(AppError::NotFound)?;
    submit_response(pool, invite.event_id, token, choice, name).await
}

async fn apply_response(
    event: &Event,
    invite: &Invite,
    choice: RsvpChoice,
    response_seq: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<RsvpOutcome, AppError> {
    let previous = db::rsvp::get_for_invite(invite.id, &mut *conn)
        .await?
        .map(|r| r.status)
        .unwrap_or(RsvpStatus::NoResponse);

    let promoted = match (choice, previous) {
        (RsvpChoice::Attending, RsvpStatus::Confirmed)
        | (RsvpChoice::Declined, RsvpStatus::Declined) => {
            db::rsvp::touch(invite.id, now, &mut *conn).await?;
            Vec::new()
        }
        (RsvpChoice::Attending, RsvpStatus::Waitlisted) => {
            // Keeps the original place in line.
            db::rsvp::touch(invite.id, now, &mut *conn).await?;
            promote_from_waitlist(event, conn).await?
        }
        (RsvpChoice::Attending, _) => {
            let confirmed =
                db::rsvp::count_by_status(event.id, RsvpStatus::Confirmed, &mut *conn).await?;
            let (status, seat) = if confirmed < event.capacity {
                (RsvpStatus::Confirmed, next_seat_number(event, conn).await?)
            } else {
                (RsvpStatus::Waitlisted, None)
            };
            db::rsvp::upsert(invite.id, event.id, status, seat, response_seq, now, &mut *conn)
                .await?;
            Vec::new()
        }
        (RsvpChoice::Declined, previous) => {
            db::rsvp::upsert(
                invite.id,
                event.id,
                RsvpStatus::Declined,
                None,
                response_seq,
                now,
                &mut *conn,
            )
            .await?;
            if previous == RsvpStatus::Confirmed {
                promote_from_waitlist(event, conn).await?
            } else {
                Vec::new()
            }
        }
    };

    let current = db::rsvp::get_for_invite(invite.id, &mut *conn)
        .await?
        .ok_or(AppError::InternalError)?;

    let mut promoted_names = Vec::with_capacity(promoted.len());
    for rsvp in promoted.iter().filter(|r| r.invite_id != invite.id) {
        if let Some(guest) = db::invitations::get_by_id(rsvp.invite_id, &mut *conn).await? {
            promoted_names.push(guest.display_name().to_string());
        }
    }

    Ok(RsvpOutcome {
        status: current.status,
        seat_number: current.seat_number,
        promoted: promoted_names,
    })
}

/// Fills free seats from the head of the waitlist until the event is full or
/// nobody is waiting. Returns the promoted rows in promotion order.
pub async fn promote_from_waitlist(
    event: &Event,
    conn: &mut SqliteConnection,
) -> Result<Vec<Rsvp>, sqlx::Error> {
    let mut promoted = Vec::new();
    loop {
        let confirmed =
            db::rsvp::count_by_status(event.id, RsvpStatus::Confirmed, &mut *conn).await?;
        if confirmed >= event.capacity {
            break;
        }
        let Some(next) = db::rsvp::earliest_waitlisted(event.id, &mut *conn).await? else {
            break;
        };
        let seat = next_seat_number(event, conn).await?;
        db::rsvp::confirm(next.id, seat, &mut *conn).await?;
        info!(
            "event {}: promoted invite {} from the waitlist to seat {:?}",
            event.id, next.invite_id, seat
        );
        promoted.push(Rsvp {
            status: RsvpStatus::Confirmed,
            seat_number: seat,
            ..next
        });
    }
    Ok(promoted)
}

/// Moves guests sitting above the event's capacity into the lowest free seats.
/// The confirmed count must already fit the capacity.
pub async fn reseat_within_capacity(
    event: &Event,
    conn: &mut SqliteConnection,
) -> Result<usize, sqlx::Error> {
    let mut seats = db::rsvp::confirmed_seats(event.id, &mut *conn).await?;
    let mut stranded: Vec<i64> = seats.iter().copied().filter(|seat| *seat > event.capacity).collect();
    stranded.sort_unstable();

    let mut moved = 0;
    for from in stranded {
        let Some(to) = lowest_free_seat(event.capacity, &seats) else {
            break;
        };
        db::rsvp::move_seat(event.id, from, to, &mut *conn).await?;
        info!("event {}: seat {} moved to {}", event.id, from, to);
        seats.retain(|seat| *seat != from);
        seats.push(to);
        moved += 1;
    }
    Ok(moved)
}

async fn next_seat_number(
    event: &Event,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let taken = db::rsvp::confirmed_seats(event.id, &mut *conn).await?;
    Ok(lowest_free_seat(event.capacity, &taken))
}

pub fn lowest_free_seat(capacity: i64, taken: &[i64]) -> Option<i64> {
    let taken: HashSet<i64> = taken.iter().copied().collect();
    (1..=capacity).find(|seat| !taken.contains(seat))
}

pub async fn view_invite(pool: &DbPool, token: &str) -> Result<InviteView, AppError> {
    let invite = db::invitations::get_by_token(token, pool)
        .await?
        .ok_or(AppError::NotFound)?;
    let event = db::event::get_by_id(invite.event_id, pool)
        .await?
        .ok_or(AppError::NotFound)?;
    let rsvp = db::rsvp::get_for_invite(invite.id, pool).await?;
    let confirmed_count =
        db::rsvp::count_by_status(event.id, RsvpStatus::Confirmed, pool).await?;

    Ok(InviteView {
        guest_name: invite.display_name().to_string(),
        status: rsvp.as_ref().map(|r| r.status).unwrap_or(RsvpStatus::NoResponse),
        seat_number: rsvp.and_then(|r| r.seat_number),
        confirmed_count,
        seats_remaining: (event.capacity - confirmed_count).max(0),
        event,
    })
}
