//! Cookie sessions. The cookie carries an HS256 token whose subject is the
//! user id; `SessionAuth` decodes it on every request and leaves a
//! `SessionUser` in the request extensions for handlers to read.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures::future::{ok, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "projexia_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Id of the signed-in user, present only when the session cookie checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

pub fn create_session_token(user_id: &str, secret: &str, ttl_hours: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + chrono::Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
}

pub fn validate_session_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn session_cookie(token: String, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(ttl_hours))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

pub fn session_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<SessionUser>().map(|u| u.0.clone())
}

pub struct SessionAuth {
    secret: Rc<String>,
}

impl SessionAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        SessionAuth {
            secret: Rc::new(secret.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddleware {
            service,
            secret: Rc::clone(&self.secret),
        })
    }
}

pub struct SessionMiddleware<S> {
    service: S,
    secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            match validate_session_token(cookie.value(), &self.secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(SessionUser(claims.sub));
                }
                // Stale cookies just mean an anonymous request.
                Err(e) => debug!("Ignoring session cookie: {}", e),
            }
        }
        self.service.call(req)
    }
}
