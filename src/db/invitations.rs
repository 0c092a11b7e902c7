use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::Invite;

const INVITE_COLUMNS: &str = "id, event_id, email, name, token, approved, created_at";

pub async fn create<'c, E>(
    event_id: i64,
    email: &str,
    name: Option<&str>,
    token: &str,
    approved: bool,
    created_at: DateTime<Utc>,
    conn: E,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO invites (event_id, email, name, token, approved, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(event_id)
    .bind(email)
    .bind(name)
    .bind(token)
    .bind(approved)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn get_by_id<'c, E>(id: i64, conn: E) -> Result<Option<Invite>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Invite>(&format!("SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn get_by_token<'c, E>(token: &str, conn: E) -> Result<Option<Invite>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Invite>(&format!(
        "SELECT {INVITE_COLUMNS} FROM invites WHERE token = $1"
    ))
    .bind(token)
    .fetch_optional(conn)
    .await
}

pub async fn get_by_event_and_email<'c, E>(
    event_id: i64,
    email: &str,
    conn: E,
) -> Result<Option<Invite>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Invite>(&format!(
        "SELECT {INVITE_COLUMNS} FROM invites WHERE event_id = $1 AND email = $2"
    ))
    .bind(event_id)
    .bind(email)
    .fetch_optional(conn)
    .await
}

pub async fn set_name<'c, E>(id: i64, name: &str, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE invites SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_token<'c, E>(id: i64, token: &str, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE invites SET token = $1 WHERE id = $2")
        .bind(token)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn approve<'c, E>(id: i64, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE invites SET approved = 1 WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete<'c, E>(id: i64, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM invites WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
