use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;

use crate::{
   config::Config,
   dto::{NewEventDto, UpdateEventDto},
   service::{self, metadata::MetadataFetcher},
   DbPool,
};

#[get("/")]
pub async fn listing(pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::event::listing(Utc::now(), conn).await {
      Ok(listing) => HttpResponse::Ok().json(listing),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[get("")]
pub async fn dashboard(pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::event::dashboard(conn).await {
      Ok(dashboard) => HttpResponse::Ok().json(dashboard),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/events")]
pub async fn create(
   new_event_dto: web::Json<NewEventDto>,
   fetcher: web::Data<MetadataFetcher>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   let res = service::event::create(new_event_dto.into_inner(), fetcher.get_ref(), conn)
      .await;
   match res {
      Ok(saved) => HttpResponse::Created().json(saved),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[get("/events/{id}")]
pub async fn details(
   id: web::Path<i64>,
   config: web::Data<Config>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::event::details(id.into_inner(), config.get_ref(), conn).await {
      Ok(details) => HttpResponse::Ok().json(details),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[put("/events/{id}")]
pub async fn update(
   id: web::Path<i64>,
   update_event_dto: web::Json<UpdateEventDto>,
   fetcher: web::Data<MetadataFetcher>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   let res = service::event::update(
      id.into_inner(),
      update_event_dto.into_inner(),
      fetcher.get_ref(),
      conn
   ).await;
   match res {
      Ok(saved) => HttpResponse::Ok().json(saved),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[delete("/events/{id}")]
pub async fn remove(id: web::Path<i64>, pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::event::delete(id.into_inner(), conn).await {
      Ok(()) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/events/{id}/refresh-metadata")]
pub async fn refresh_metadata(
   id: web::Path<i64>,
   fetcher: web::Data<MetadataFetcher>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::event::refresh_metadata(id.into_inner(), fetcher.get_ref(), conn).await {
      Ok(event) => HttpResponse::Ok().json(event),
      Err(err) => HttpResponse::from_error(err)
   }
}

pub fn init_public_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(listing);
}

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(dashboard)
      .service(create)
      .service(details)
      .service(update)
      .service(remove)
      .service(refresh_metadata);
}
