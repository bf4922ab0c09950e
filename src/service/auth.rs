use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::debug;

use crate::{errors::ServiceError, models::Actor};

/// Attaches the bearer token's [`Actor`] to the request. Requests without a
/// token pass through anonymously; a malformed or expired token is rejected.
pub struct AuthMiddleware {
    pub jwt_secret: Rc<String>,
}

impl AuthMiddleware {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: Rc::new(jwt_secret.to_string()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match jwt::parse_request(&req, "Bearer ") {
            None => {}
            Some(token) => match jwt::decode_actor(&token, &self.jwt_secret) {
                Ok(actor) => {
                    req.extensions_mut().insert(actor);
                }
                Err(err) => {
                    debug!("rejected bearer token: {:?}", err);
                    return Box::pin(async move { Err(ServiceError::Unauthorized.into()) });
                }
            },
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

impl FromRequest for Actor {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Actor>()
                .copied()
                .ok_or(ServiceError::Unauthorized),
        )
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{
        decode, encode, errors::Error, Algorithm, DecodingKey, EncodingKey, Header, Validation,
    };
    use uuid::Uuid;

    use crate::{
        dto::Claims,
        models::{Actor, Role},
    };

    pub fn create(user_id: &Uuid, role: Role, ttl_secs: i64, secret: &str) -> Result<String, Error> {
        let exp = (Utc::now().timestamp() + ttl_secs) as usize;
        let claims = Claims::new(user_id, role, exp);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Validates signature and expiry.
    pub fn decode_actor(token: &str, secret: &str) -> Result<Actor, Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(Actor::new(data.claims.sub, data.claims.role))
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(prefix))
            .map(|token| token.trim().to_string())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn token_round_trips_identity_and_role() {
            let id = Uuid::new_v4();
            let token = create(&id, Role::Admin, 60, "s3cret").unwrap();
            let actor = decode_actor(&token, "s3cret").unwrap();
            assert_eq!(actor, Actor::new(id, Role::Admin));
        }

        #[test]
        fn wrong_secret_and_expired_tokens_fail() {
            let id = Uuid::new_v4();
            let token = create(&id, Role::User, 60, "s3cret").unwrap();
            assert!(decode_actor(&token, "other").is_err());

            let expired = create(&id, Role::User, -3600, "s3cret").unwrap();
            assert!(decode_actor(&expired, "s3cret").is_err());
        }
    }
}
