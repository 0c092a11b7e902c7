use sqlx::{Executor, Sqlite};

use crate::models::{MovieRequest, RequestStatus};

pub async fn create<'c, E>(request: &MovieRequest, conn: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO movie_requests (title, catalog_url, poster_url, requester_name, requester_email, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&request.title)
    .bind(&request.catalog_url)
    .bind(&request.poster_url)
    .bind(&request.requester_name)
    .bind(&request.requester_email)
    .bind(request.status)
    .bind(request.created_at)
    .execute(conn)
    .await?;
    Ok(res.last_insert_rowid())
}

/// Newest first.
pub async fn get_all<'c, E>(conn: E) -> Result<Vec<MovieRequest>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, MovieRequest>(
        "SELECT id, title, catalog_url, poster_url, requester_name, requester_email, status, created_at
         FROM movie_requests
         ORDER BY id DESC",
    )
    .fetch_all(conn)
    .await
}

pub async fn set_status<'c, E>(id: i64, status: RequestStatus, conn: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query("UPDATE movie_requests SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
