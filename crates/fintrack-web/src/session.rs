//! Session cookie handling and the guard middleware
//!
//! Protected routers run behind one of two middlewares. Both resolve the
//! session cookie through `SessionGuard` before the handler runs; pages are
//! redirected to the sign-in route, JSON routes get a 401. An allowed
//! request carries its `Session` in the request extensions, where
//! `RecordsContext` picks it up.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use fintrack_core::{CoreError, GuardDecision, RecordStore, Session, SessionGuard};

use crate::error::ApiError;
use crate::AppState;

/// Value of the cookie `name`, if the request carries one
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores the session token
pub fn session_cookie(name: &str, token: &str, ttl_minutes: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        token,
        ttl_minutes.saturating_mul(60)
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

fn guard(state: &AppState, headers: &HeaderMap) -> GuardDecision {
    let marker = read_cookie(headers, &state.config.session.cookie_name);
    SessionGuard::new(&state.registry).check(marker.as_deref())
}

/// Guard for HTML pages and form posts
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard(&state, request.headers()) {
        GuardDecision::Allow(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardDecision::Redirect(to) => Redirect::to(to).into_response(),
    }
}

/// Guard for the JSON API
pub async fn require_session_api(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard(&state, request.headers()) {
        GuardDecision::Allow(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardDecision::Redirect(_) => ApiError::Unauthorized.into_response(),
    }
}

/// The signed-in session and its loaded record store
///
/// Extraction waits for the store's initial fetch, so a handler never sees
/// the store while it is still loading. Used on a route that is not behind
/// the guard, extraction fails with `CoreError::OutsideProvider`.
pub struct RecordsContext {
    pub session: Session,
    pub store: Arc<RecordStore>,
}

#[async_trait]
impl<S> FromRequestParts<S> for RecordsContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(CoreError::OutsideProvider)?;
        let store = session.store();
        store.ensure_loaded().await;
        Ok(Self { session, store })
    }
}
