//! Cookie backed sessions.
//!
//! The cookie holds an HS256 token whose subject is the user id. On every
//! request the [`Session`] extractor turns it back into a principal by looking
//! the user up, anything that goes wrong on the way yields an anonymous
//! session.

use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Method},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{models::User, repository, AppState};

pub const SESSION_COOKIE: &str = "session";

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Invalid session token")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct Claims {
    sub: i32,
    iat: i64,
    exp: i64,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifetime: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<String, SessionError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<i32, SessionError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims.sub)
    }

    pub fn login_cookie(&self, user_id: i32) -> Result<Cookie<'static>, SessionError> {
        Ok(Cookie::build((SESSION_COOKIE, self.issue(user_id)?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .into())
    }
}

pub fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// The principal of the current request, if any.
pub struct Session(pub Option<User>);

impl Session {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

async fn load_principal(state: &AppState, token: &str) -> Option<User> {
    let user_id = match state.sessions.verify(token) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Discarding session cookie: {e:?}");
            return None;
        }
    };

    let mut conn = match state.connection().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!("Could not load session for user {user_id}: {e}");
            return None;
        }
    };

    match repository::user::get_by_id(&mut conn, user_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Could not load session for user {user_id}: {e} ({e:?})");
            None
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        Ok(match jar.get(SESSION_COOKIE) {
            None => Session(None),
            Some(cookie) => Session(load_principal(state, cookie.value()).await),
        })
    }
}

/// Rejection for routes that need a logged in user.
#[derive(Debug)]
pub struct LoginRequired {
    next: Option<String>,
}

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        match self.next {
            Some(next) => Redirect::to(&format!("/login?next={next}")).into_response(),
            None => Redirect::to("/login").into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = LoginRequired;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Session(user) = match Session::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };

        user.ok_or_else(|| LoginRequired {
            // Only a GET can be replayed after logging in
            next: (parts.method == Method::GET).then(|| parts.uri.path().to_string()),
        })
    }
}

/// Where to go after logging in. Only paths on this site are followed.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/index",
    }
}
