use std::future::{ready, Ready};
use actix_web::{body::EitherBody, dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform}, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;
use log::warn;

use crate::{config::Config, dto::AdminSession, errors::AppError, service::crypto};

pub const SESSION_COOKIE: &str = "admin_session";

/// Attached to the request extensions once the admin session checks out.
#[derive(Debug, Clone)]
pub struct AdminAuthData {
    pub expires_at: usize,
}

pub struct AdminAuthMiddleware {
    pub secret_key: String
}

impl<S, B> Transform<S, ServiceRequest> for AdminAuthMiddleware
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AdminAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddlewareService {
            service,
            secret_key: self.secret_key.clone()
        }))
    }
}

pub struct AdminAuthMiddlewareService<S> {
    service: S,
    secret_key: String
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddlewareService<S>
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = jwt::parse_request(&req)
            .ok_or(AppError::Unauthorized)
            .and_then(|token| jwt::decode_claims(&token, &self.secret_key));
        match claims {
            Ok(claims) => {
                req.extensions_mut().insert(AdminAuthData { expires_at: claims.exp });
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            },
            Err(err) => {
                warn!("rejected admin request to {}", req.path());
                let res = req.into_response(HttpResponse::from_error(err)).map_into_right_body();
                Box::pin(async move {
                    Ok(res)
                })
            }
        }
    }
}

/// Exchanges the shared admin password for a signed session token. Any
/// mismatch answers with the same `Unauthorized`.
pub fn login(password: &str, config: &Config) -> Result<AdminSession, AppError> {
    if !crypto::passwords_match(password, &config.admin_password) {
        warn!("failed admin login attempt");
        return Err(AppError::Unauthorized);
    }
    jwt::create(&config.secret_key, config.session_ttl_hours)
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use log::error;

    use super::SESSION_COOKIE;
    use crate::{dto::{AdminSession, Claims}, errors::AppError};

    pub fn create(secret: &str, ttl_hours: i64) -> Result<AdminSession, AppError> {
        let expires_at = Utc::now() + Duration::hours(ttl_hours);
        let header = Header::new(Algorithm::HS256);
        let claims = Claims::admin(&expires_at);
        let key = EncodingKey::from_secret(secret.as_bytes());
        let token = encode(&header, &claims, &key).map_err(|err| {
            error!("[{:} : {:}] TOKEN ENCODING ERROR: {:?}", file!(), line!(), err);
            AppError::InternalError
        })?;
        Ok(AdminSession { token, expires_at })
    }

    /// Signature, expiry and subject must all check out.
    pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.sub = Some("admin".to_string());
        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Bearer header first, then the session cookie.
    pub fn parse_request(req: &ServiceRequest) -> Option<String> {
        if let Some(auth_header) = req.headers().get("Authorization") {
            if let Ok(auth_value) = auth_header.to_str() {
                if let Some(token) = auth_value.strip_prefix("Bearer ") {
                    return Some(token.trim().to_string());
                }
            }
        }
        req.cookie(SESSION_COOKIE).map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_is_rejected() {
        let config = Config::default();
        assert_eq!(login("movienigh", &config).unwrap_err(), AppError::Unauthorized);
        assert_eq!(login("", &config).unwrap_err(), AppError::Unauthorized);
        assert!(login("movienight", &config).is_ok());
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let session = jwt::create("some-other-secret", 1).unwrap();
        assert_eq!(
            jwt::decode_claims(&session.token, "dev-secret-key").unwrap_err(),
            AppError::Unauthorized
        );
        assert!(jwt::decode_claims(&session.token, "some-other-secret").is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let session = jwt::create("dev-secret-key", -1).unwrap();
        assert_eq!(
            jwt::decode_claims(&session.token, "dev-secret-key").unwrap_err(),
            AppError::Unauthorized
        );
    }
}
