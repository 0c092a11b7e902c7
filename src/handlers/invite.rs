use actix_web::{get, post, web, HttpResponse, Responder};

use crate::{
   config::Config,
   dto::{InviteRequestDto, NewInvitesDto, RsvpDto},
   service,
   DbPool,
};

#[get("/invite/{token}")]
pub async fn view(token: web::Path<String>, pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::rsvp::view_invite(conn, &token).await {
      Ok(view) => HttpResponse::Ok().json(view),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/invite/{token}")]
pub async fn respond(
   token: web::Path<String>,
   rsvp_dto: web::Json<RsvpDto>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   let dto = rsvp_dto.into_inner();
   let res = service::rsvp::submit_by_token(conn, &token, dto.response, dto.name.as_deref())
      .await;
   match res {
      Ok(outcome) => HttpResponse::Ok().json(outcome),
      Err(err) => HttpResponse::from_error(err)
   }
}

/// The token must belong to the event named in the path.
#[post("/events/{event_id}/rsvp/{token}")]
pub async fn respond_to_event(
   path: web::Path<(i64, String)>,
   rsvp_dto: web::Json<RsvpDto>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   let (event_id, token) = path.into_inner();
   let dto = rsvp_dto.into_inner();
   let res = service::rsvp::submit_response(conn, event_id, &token, dto.response, dto.name.as_deref())
      .await;
   match res {
      Ok(outcome) => HttpResponse::Ok().json(outcome),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/events/{event_id}/request-invite")]
pub async fn request_invite(
   event_id: web::Path<i64>,
   request_dto: web::Json<InviteRequestDto>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::invitation::request_invite(event_id.into_inner(), request_dto.into_inner(), conn).await {
      Ok(()) => HttpResponse::Accepted().finish(),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/events/{event_id}/invites")]
pub async fn create(
   event_id: web::Path<i64>,
   invites_dto: web::Json<NewInvitesDto>,
   config: web::Data<Config>,
   pool_state: web::Data<DbPool>
) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   let res = service::invitation::create_invites(
      event_id.into_inner(),
      invites_dto.into_inner(),
      config.get_ref(),
      conn
   ).await;
   match res {
      Ok(batch) => HttpResponse::Created().json(batch),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/invites/{id}/approve")]
pub async fn approve(id: web::Path<i64>, pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::invitation::approve(id.into_inner(), conn).await {
      Ok(invite) => HttpResponse::Ok().json(invite),
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/invites/{id}/reject")]
pub async fn reject(id: web::Path<i64>, pool_state: web::Data<DbPool>) -> impl Responder {
   let conn: &DbPool = pool_state.get_ref();
   match service::invitation::reject(id.into_inner(), conn).await {
      Ok(()) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err)
   }
}

pub fn init_public_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(view)
      .service(respond)
      .service(respond_to_event)
      .service(request_invite);
}

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(create)
      .service(approve)
      .service(reject);
}
