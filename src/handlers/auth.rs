use actix_web::{cookie::{Cookie, SameSite}, post, web, HttpResponse, Responder};
use log::info;

use crate::{config::Config, dto::LoginRequest, service::{self, auth::SESSION_COOKIE}};

#[post("/admin/login")]
pub async fn login(dto: web::Json<LoginRequest>, config: web::Data<Config>) -> impl Responder {
   match service::auth::login(&dto.password, config.get_ref()) {
      Ok(session) => {
         info!("admin session issued, expires at {}", session.expires_at);
         let cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish();
         HttpResponse::Ok().cookie(cookie).json(session)
      },
      Err(err) => HttpResponse::from_error(err)
   }
}

#[post("/admin/logout")]
pub async fn logout() -> impl Responder {
   let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
   cookie.make_removal();
   HttpResponse::NoContent().cookie(cookie).finish()
}

/// Registered ahead of the guarded `/admin` scope so login stays reachable.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(login)
      .service(logout);
}
