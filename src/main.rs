pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use sqlx::{Pool, Sqlite};

use config::Config;
use db::init_db_pool;
use service::{log::{init_logger, LoggerMiddleware}, metadata::MetadataFetcher};

pub type DbPool = Pool<Sqlite>;

fn startup_error(what: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("[{:} : {:}] {} FAILED: {}", file!(), line!(), what, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{what}: {err}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    init_logger();

    let config = Config::from_env().map_err(|e| startup_error("CONFIG", e))?;
    let pool: DbPool = init_db_pool(&config.database_url)
        .await
        .map_err(|e| startup_error("DATABASE", e))?;
    let fetcher = MetadataFetcher::new(&config).map_err(|e| startup_error("HTTP CLIENT", e))?;

    let bind = (config.bind_addr.clone(), config.port);
    info!("listening on {}:{}, invite links under {}", bind.0, bind.1, config.public_base_url);

    let pool_data = web::Data::new(pool);
    let config_data = web::Data::new(config);
    let fetcher_data = web::Data::new(fetcher);
    HttpServer::new(move || {
        let secret_key = config_data.secret_key.clone();
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(fetcher_data.clone())
            .configure(|cfg| handlers::init_routes(cfg, &secret_key))
    })
    .bind(bind)?
    .run()
    .await
}
