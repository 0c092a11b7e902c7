use actix_web::{get, post, web, HttpResponse, Responder};

use crate::{
   dto::NewMovieRequestDto,
   models::RequestStatus,
   service::{self, metadata::MetadataFetcher},
   DbPool,
};

#[get("/requests")]
pub async fn get_all(pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::requests::get_all(conn).await {
      Ok(requests) => HttpResponse::Ok().json(requests),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/requests")]
pub async fn create(
   request_dto: web::Json<NewMovieRequestDto>,
   fetcher: web::Data<MetadataFetcher>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::requests::create(request_dto.into_inner(), fetcher.get_ref(), conn).await {
      Ok(saved) => HttpResponse::Created().json(saved),
      Err(err) => HttpResponse::from_error(err)
   }
}

async fn decide(id: i64, status: RequestStatus, conn: &DbPool) -> HttpResponse {
   match service::requests::set_status(id, status, conn).await {
      Ok(()) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/requests/{id}/approve")]
pub async fn approve(id: web::Path<i64>, pool_state: web::Data<DbPool>) -> impl Responder {
   decide(id.into_inner(), RequestStatus::Approved, pool_state.get_ref()).await
}

#[post("/requests/{id}/reject")]
pub async fn reject(id: web::Path<i64>, pool_state: web::Data<DbPool>) -> impl Responder {
   decide(id.into_inner(), RequestStatus::Rejected, pool_state.get_ref()).await
}

pub fn init_public_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(get_all)
      .service(create);
}

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(approve)
      .service(reject);
}
