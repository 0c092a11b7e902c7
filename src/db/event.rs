use sqlx::{Executor, Sqlite};

use crate::models::Event;

const EVENT_COLUMNS: &str = "id, title, catalog_url, poster_url, synopsis, starts_at, location, \
    capacity, notes, metadata_overrides, response_seq, created_at";

/// Inserts `event` (its `id` is ignored) and returns the new row id.
pub async fn create<'c, E>(event: &Event, conn: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO events (title, catalog_url, poster_url, synopsis, starts_at, location, \
         capacity, notes, metadata_overrides, response_seq, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10)",
    )
    .bind(&event.title)
    .bind(&event.catalog_url)
    .bind(&event.poster_url)
    .bind(&event.synopsis)
    .bind(event.starts_at)
    .bind(&event.location)
    .bind(event.capacity)
    .bind(&event.notes)
    .bind(event.metadata_overrides)
    .bind(event.created_at)
    .execute(conn)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn get_by_id<'c, E>(id: i64, conn: E) -> Result<Option<Event>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// All events, earliest first.
pub async fn get_all<'c, E>(conn: E) -> Result<Vec<Event>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at ASC, id ASC"
    ))
    .fetch_all(conn)
    .await
}

/// Writes every editable column of `event`. Returns the number of rows touched.
pub async fn update<'c, E>(event: &Event, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "UPDATE events
         SET title = $1, catalog_url = $2, poster_url = $3, synopsis = $4, starts_at = $5,
             location = $6, capacity = $7, notes = $8, metadata_overrides = $9
         WHERE id = $10",
    )
    .bind(&event.title)
    .bind(&event.catalog_url)
    .bind(&event.poster_url)
    .bind(&event.synopsis)
    .bind(event.starts_at)
    .bind(&event.location)
    .bind(event.capacity)
    .bind(&event.notes)
    .bind(event.metadata_overrides)
    .bind(event.id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete<'c, E>(id: i64, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

/// Bumps the event's response counter and returns the new value, or `None`
/// when the event does not exist. Being a write, it also takes the database
/// write lock for the rest of the surrounding transaction.
pub async fn next_response_seq<'c, E>(id: i64, conn: E) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "UPDATE events SET response_seq = response_seq + 1 WHERE id = $1 RETURNING response_seq",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// No-op write on the event row. Run first in a transaction, it takes the
/// write lock before anything is read. `None` when the event does not exist.
pub async fn lock<'c, E>(id: i64, conn: E) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "UPDATE events SET response_seq = response_seq WHERE id = $1 RETURNING id",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Same as [`lock`], addressed through one of the event's invites.
pub async fn lock_for_invite<'c, E>(invite_id: i64, conn: E) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "UPDATE events SET response_seq = response_seq
         WHERE id = (SELECT event_id FROM invites WHERE id = $1)
         RETURNING id",
    )
    .bind(invite_id)
    .fetch_optional(conn)
    .await
}
