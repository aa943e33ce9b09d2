//! Session cookie handling.
//!
//! Every page request carries a session id: the one in the cookie when it is
//! a well-formed UUID, otherwise a freshly minted one that is set on the
//! response. Handlers reach the session through the [`BrowserSession`]
//! extractor.

use std::ops::Deref;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domains::SessionId;
use services::Session;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn session_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(&state.cookie.name)
        .and_then(|c| Uuid::parse_str(c.value()).ok());

    match existing {
        Some(id) => {
            req.extensions_mut().insert(SessionId::new(id.to_string()));
            next.run(req).await
        }
        None => {
            let id = Uuid::new_v4().to_string();
            req.extensions_mut().insert(SessionId::new(id.clone()));
            let cookie = Cookie::build((state.cookie.name.clone(), id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.cookie.secure)
                .build();
            (jar.add(cookie), next.run(req).await).into_response()
        }
    }
}

/// The caller's session, bound to the configured session store.
pub struct BrowserSession(pub Session);

impl Deref for BrowserSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl FromRequestParts<AppState> for BrowserSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or(ApiError::NoSession)?;
        Ok(BrowserSession(Session::new(state.sessions.clone(), id)))
    }
}
