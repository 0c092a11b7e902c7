pub mod event;
pub mod invitations;
pub mod requests;
pub mod rsvp;

use std::{str::FromStr, time::Duration};

use crate::DbPool;
use log::{info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub async fn init_db_pool(db_url: &str) -> Result<DbPool, sqlx::Error> {
    warn!("database url: {}", db_url);
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool: DbPool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    info!("{}", "Connected to sqlite".to_string());
    Ok(pool)
}

pub async fn migrate(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Fresh in-memory database. A single connection keeps every query on the same database.
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

/// WAL database file under `dir` with the production pool settings, for tests
/// whose transactions have to overlap on separate connections.
#[cfg(test)]
pub async fn file_test_pool(dir: &std::path::Path) -> DbPool {
    let url = format!("sqlite://{}", dir.join("movie_night.db").display());
    init_db_pool(&url).await.unwrap()
}

#[cfg(test)]
pub async fn seed_event(pool: &DbPool, capacity: i64) -> i64 {
    use chrono::{Duration as ChronoDuration, Utc};

    let event = crate::models::Event {
        id: 0,
        title: "Stalker".to_string(),
        catalog_url: "https://letterboxd.com/film/stalker".to_string(),
        poster_url: None,
        synopsis: None,
        starts_at: Utc::now() + ChronoDuration::days(7),
        location: "Living room".to_string(),
        capacity,
        notes: None,
        metadata_overrides: 0,
        response_seq: 0,
        created_at: Utc::now(),
    };
    event::create(&event, pool).await.unwrap()
}

/// Approved invite for `email`; returns its token.
#[cfg(test)]
pub async fn seed_invite(pool: &DbPool, event_id: i64, email: &str) -> String {
    let token = crate::service::crypto::generate_token();
    invitations::create(event_id, email, None, &token, true, chrono::Utc::now(), pool)
        .await
        .unwrap();
    token
}
