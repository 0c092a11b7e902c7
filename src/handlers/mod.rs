pub mod auth;
pub mod event;
pub mod invite;
pub mod request;

use actix_web::web;

use crate::service::auth::AdminAuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig, secret_key: &str) {
   cfg.configure(auth::init_routes)
      .service(
         web::scope("/admin")
            .wrap(AdminAuthMiddleware {
               secret_key: secret_key.to_string()
            })
            .configure(event::init_admin_routes)
            .configure(invite::init_admin_routes)
            .configure(request::init_admin_routes)
      )
      .configure(event::init_public_routes)
      .configure(invite::init_public_routes)
      .configure(request::init_public_routes);
}

#[cfg(test)]
mod tests {
   use actix_web::{cookie::Cookie, http::StatusCode, test, web, App};
   use serde_json::{json, Value};

   use super::init_routes;
   use crate::{
      config::Config,
      db::{seed_event, test_pool},
      service::{self, auth::SESSION_COOKIE, metadata::MetadataFetcher},
   };

   macro_rules! test_app {
      ($pool:expr, $config:expr) => {
         test::init_service(
            App::new()
               .app_data(web::Data::new($pool.clone()))
               .app_data(web::Data::new(MetadataFetcher::new(&$config).unwrap()))
               .app_data(web::Data::new($config.clone()))
               .configure(|cfg| init_routes(cfg, &$config.secret_key)),
         )
         .await
      };
   }

   fn offline_config() -> Config {
      Config { catalog_host: "localhost".to_string(), ..Config::default() }
   }

   fn bearer(config: &Config) -> (&'static str, String) {
      let session = service::auth::login(&config.admin_password, config).unwrap();
      ("Authorization", format!("Bearer {}", session.token))
   }

   fn token_from(link: &Value) -> String {
      link.as_str().unwrap().rsplit('/').next().unwrap().to_string()
   }

   #[actix_rt::test]
   async fn admin_scope_needs_a_session() {
      let pool = test_pool().await;
      let config = offline_config();
      let app = test_app!(pool, config);

      let req = test::TestRequest::get().uri("/admin").to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

      let req = test::TestRequest::post()
         .uri("/admin/login")
         .set_json(json!({ "password": "popcorn" }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

      let req = test::TestRequest::post()
         .uri("/admin/login")
         .set_json(json!({ "password": config.admin_password }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::OK);
      let session: Value = test::read_body_json(resp).await;
      let token = session["token"].as_str().unwrap().to_string();

      let req = test::TestRequest::get()
         .uri("/admin")
         .cookie(Cookie::new(SESSION_COOKIE, token.clone()))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

      let req = test::TestRequest::get()
         .uri("/admin")
         .insert_header(("Authorization", format!("Bearer {token}")))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
   }

   #[actix_rt::test]
   async fn event_is_saved_with_a_warning_when_catalog_is_down() {
      let pool = test_pool().await;
      let config = offline_config();
      let app = test_app!(pool, config);

      let req = test::TestRequest::post()
         .uri("/admin/events")
         .insert_header(bearer(&config))
         .set_json(json!({
            "catalog_url": "http://localhost:9/film/stalker/",
            "title": "Stalker",
            "starts_at": "2030-05-01T20:00:00Z",
            "location": "Living room",
            "capacity": 6
         }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      let saved: Value = test::read_body_json(resp).await;
      assert_eq!(saved["event"]["title"], "Stalker");
      assert_eq!(saved["event"]["catalog_url"], "http://localhost:9/film/stalker");
      assert!(saved["warning"].is_string());

      let req = test::TestRequest::post()
         .uri("/admin/events")
         .insert_header(bearer(&config))
         .set_json(json!({ "catalog_url": "http://localhost:9/film/x", "location": "Den" }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
      let body: Value = test::read_body_json(resp).await;
      assert!(body["error"].is_string());

      let req = test::TestRequest::get().uri("/").to_request();
      let listing: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(listing["upcoming"].as_array().unwrap().len(), 1);
   }

   #[actix_rt::test]
   async fn guests_answer_through_their_links() {
      let pool = test_pool().await;
      let config = offline_config();
      let event = seed_event(&pool, 1).await;
      let other_event = seed_event(&pool, 1).await;
      let app = test_app!(pool, config);

      let req = test::TestRequest::post()
         .uri(&format!("/admin/events/{event}/invites"))
         .insert_header(bearer(&config))
         .set_json(json!({ "emails": "a@example.com\nb@example.com", "names": "Ada\nBo" }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      let batch: Value = test::read_body_json(resp).await;
      let ada = token_from(&batch["invites"][0]["link"]);
      let bo = token_from(&batch["invites"][1]["link"]);

      let attend = json!({ "response": "attending" });
      let req = test::TestRequest::post().uri(&format!("/invite/{ada}")).set_json(&attend).to_request();
      let outcome: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(outcome["status"], "confirmed");
      assert_eq!(outcome["seat_number"], 1);

      let req = test::TestRequest::post()
         .uri(&format!("/events/{event}/rsvp/{bo}"))
         .set_json(&attend)
         .to_request();
      let outcome: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(outcome["status"], "waitlisted");

      let req = test::TestRequest::post()
         .uri(&format!("/events/{other_event}/rsvp/{ada}"))
         .set_json(json!({ "response": "declined" }))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

      let req = test::TestRequest::post()
         .uri(&format!("/invite/{ada}"))
         .set_json(json!({ "response": "declined" }))
         .to_request();
      let outcome: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(outcome["status"], "declined");
      assert_eq!(outcome["promoted"], json!(["Bo"]));

      let req = test::TestRequest::get().uri(&format!("/invite/{bo}")).to_request();
      let view: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(view["status"], "confirmed");
      assert_eq!(view["seat_number"], 1);
      assert_eq!(view["seats_remaining"], 0);

      let req = test::TestRequest::get().uri("/invite/no-such-token").to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
   }

   #[actix_rt::test]
   async fn requested_invites_wait_for_the_host() {
      let pool = test_pool().await;
      let config = offline_config();
      let event = seed_event(&pool, 2).await;
      let app = test_app!(pool, config);

      let req = test::TestRequest::post()
         .uri(&format!("/events/{event}/request-invite"))
         .set_json(json!({ "name": "Walk In", "email": "walk@example.com" }))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

      let req = test::TestRequest::get()
         .uri(&format!("/admin/events/{event}"))
         .insert_header(bearer(&config))
         .to_request();
      let details: Value = test::call_and_read_body_json(&app, req).await;
      let line = &details["roster"][0];
      assert_eq!(line["approved"], false);
      let invite_id = line["invite_id"].as_i64().unwrap();
      let token = token_from(&line["link"]);

      let attend = json!({ "response": "attending" });
      let req = test::TestRequest::post().uri(&format!("/invite/{token}")).set_json(&attend).to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

      let req = test::TestRequest::post()
         .uri(&format!("/admin/invites/{invite_id}/approve"))
         .insert_header(bearer(&config))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

      let req = test::TestRequest::post().uri(&format!("/invite/{token}")).set_json(&attend).to_request();
      let outcome: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(outcome["status"], "confirmed");
   }

   #[actix_rt::test]
   async fn movie_requests_are_public_and_decided_by_admin() {
      let pool = test_pool().await;
      let config = offline_config();
      let app = test_app!(pool, config);

      let req = test::TestRequest::post()
         .uri("/requests")
         .set_json(json!({ "title": "Mirror", "requester_name": "Ada" }))
         .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      let saved: Value = test::read_body_json(resp).await;
      let id = saved["request"]["id"].as_i64().unwrap();

      let req = test::TestRequest::post().uri(&format!("/admin/requests/{id}/approve")).to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

      let req = test::TestRequest::post()
         .uri(&format!("/admin/requests/{id}/approve"))
         .insert_header(bearer(&config))
         .to_request();
      assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

      let req = test::TestRequest::get().uri("/requests").to_request();
      let requests: Value = test::call_and_read_body_json(&app, req).await;
      assert_eq!(requests[0]["status"], "approved");
   }
}
