use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::{RosterEntry, Rsvp, RsvpStatus};

const RSVP_COLUMNS: &str =
    "id, invite_id, event_id, status, seat_number, response_seq, responded_at";

pub async fn get_for_invite<'c, E>(invite_id: i64, conn: E) -> Result<Option<Rsvp>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Rsvp>(&format!(
        "SELECT {RSVP_COLUMNS} FROM rsvps WHERE invite_id = $1"
    ))
    .bind(invite_id)
    .fetch_optional(conn)
    .await
}

/// Writes the guest's answer. There is at most one row per invite; a second
/// answer overwrites the first.
pub async fn upsert<'c, E>(
    invite_id: i64,
    event_id: i64,
    status: RsvpStatus,
    seat_number: Option<i64>,
    response_seq: i64,
    responded_at: DateTime<Utc>,
    conn: E,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO rsvps (invite_id, event_id, status, seat_number, response_seq, responded_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (invite_id) DO UPDATE
         SET status = excluded.status,
             seat_number = excluded.seat_number,
             response_seq = excluded.response_seq,
             responded_at = excluded.responded_at",
    )
    .bind(invite_id)
    .bind(event_id)
    .bind(status)
    .bind(seat_number)
    .bind(response_seq)
    .bind(responded_at)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

pub async fn touch<'c, E>(
    invite_id: i64,
    responded_at: DateTime<Utc>,
    conn: E,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE rsvps SET responded_at = $1 WHERE invite_id = $2")
        .bind(responded_at)
        .bind(invite_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_by_status<'c, E>(
    event_id: i64,
    status: RsvpStatus,
    conn: E,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rsvps WHERE event_id = $1 AND status = $2")
        .bind(event_id)
        .bind(status)
        .fetch_one(conn)
        .await
}

pub async fn confirmed_seats<'c, E>(event_id: i64, conn: E) -> Result<Vec<i64>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT seat_number FROM rsvps
         WHERE event_id = $1 AND status = $2 AND seat_number IS NOT NULL",
    )
    .bind(event_id)
    .bind(RsvpStatus::Confirmed)
    .fetch_all(conn)
    .await
}

/// Head of the waitlist: lowest response sequence number.
pub async fn earliest_waitlisted<'c, E>(event_id: i64, conn: E) -> Result<Option<Rsvp>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Rsvp>(&format!(
        "SELECT {RSVP_COLUMNS} FROM rsvps
         WHERE event_id = $1 AND status = $2
         ORDER BY response_seq ASC, id ASC
         LIMIT 1"
    ))
    .bind(event_id)
    .bind(RsvpStatus::Waitlisted)
    .fetch_optional(conn)
    .await
}

pub async fn confirm<'c, E>(id: i64, seat_number: Option<i64>, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE rsvps SET status = $1, seat_number = $2 WHERE id = $3")
        .bind(RsvpStatus::Confirmed)
        .bind(seat_number)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

/// Every invite of the event with its answer, in invitation order.
pub async fn roster<'c, E>(event_id: i64, conn: E) -> Result<Vec<RosterEntry>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, RosterEntry>(
        "SELECT i.id AS invite_id, i.email, i.name, i.token, i.approved,
                r.status, r.seat_number, r.response_seq, r.responded_at
         FROM invites i
         LEFT JOIN rsvps r ON r.invite_id = i.id
         WHERE i.event_id = $1
         ORDER BY i.created_at ASC, i.id ASC",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn move_seat<'c, E>(
    event_id: i64,
    from_seat: i64,
    to_seat: i64,
    conn: E,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "UPDATE rsvps SET seat_number = $1
         WHERE event_id = $2 AND status = $3 AND seat_number = $4",
    )
    .bind(to_seat)
    .bind(event_id)
    .bind(RsvpStatus::Confirmed)
    .bind(from_seat)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}
