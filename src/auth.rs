use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::{error::ApiError, repository::RepositoryState};

/// Cookie carrying the opaque session id.
pub const SESSION_COOKIE: &str = "sid";
/// Cookie mirroring the session-bound anti-forgery token. Deliberately not
/// HttpOnly so a browser client can echo it back in the header.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header a mutating request must carry on csrf-guarded routes.
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Session
///
/// Server-side state bound to one client's session cookie: the
/// authenticated identity (if any) and the anti-forgery token issued via
/// GET /api/token.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user_id: Option<i64>,
    pub csrf_token: Option<String>,
}

/// SessionStore
///
/// The Session Manager's backing store: session-id → `Session`, shared
/// across requests. Cheap to clone (the map itself sits behind an Arc).
/// Sessions are keyed per client; there is no cross-session sharing.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or refreshes the CSRF token bound to the given session,
    /// materializing the session entry if this is its first use.
    pub fn issue_csrf(&self, sid: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.inner.write().expect("session lock poisoned");
        sessions.entry(sid.to_string()).or_default().csrf_token = Some(token.clone());
        token
    }

    /// The token previously issued for this session, if any.
    pub fn csrf_token(&self, sid: &str) -> Option<String> {
        let sessions = self.inner.read().expect("session lock poisoned");
        sessions.get(sid)?.csrf_token.clone()
    }

    /// Binds an authenticated identity to the session (login).
    pub fn establish(&self, sid: &str, user_id: i64) {
        let mut sessions = self.inner.write().expect("session lock poisoned");
        sessions.entry(sid.to_string()).or_default().user_id = Some(user_id);
    }

    /// The identity bound to the session, if any.
    pub fn identity(&self, sid: &str) -> Option<i64> {
        let sessions = self.inner.read().expect("session lock poisoned");
        sessions.get(sid)?.user_id
    }

    /// Clears the identity binding (logout). Returns whether an identity
    /// was actually bound.
    pub fn terminate(&self, sid: &str) -> bool {
        let mut sessions = self.inner.write().expect("session lock poisoned");
        sessions
            .get_mut(sid)
            .is_some_and(|s| s.user_id.take().is_some())
    }
}

/// Extracts a single cookie value from the request headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

/// Renders the Set-Cookie value for the session id cookie.
pub fn session_cookie(sid: &str, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={sid}; Path=/; SameSite=Lax; HttpOnly");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Renders the Set-Cookie value for the csrf token cookie.
pub fn csrf_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// SessionContext Extractor
///
/// Resolves the caller's session from the `sid` cookie, minting a fresh
/// session id when the client presents none. This extractor never rejects:
/// anonymous sessions are a valid state (the token and signin endpoints
/// operate on them). Handlers that require an identity use `AuthUser`
/// instead.
pub struct SessionContext {
    pub sid: String,
    store: SessionStore,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let sid = cookie_value(&parts.headers, SESSION_COOKIE)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        Ok(Self { sid, store })
    }
}

impl SessionContext {
    pub fn issue_csrf(&self) -> String {
        self.store.issue_csrf(&self.sid)
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.store.csrf_token(&self.sid)
    }

    pub fn establish(&self, user_id: i64) {
        self.store.establish(&self.sid, user_id);
    }

    pub fn terminate(&self) -> bool {
        self.store.terminate(&self.sid)
    }
}

/// AuthUser Extractor
///
/// The resolved identity of an authenticated request. Usable as a handler
/// argument on every protected route; extraction runs before the request
/// body is touched, which is what gives 401 precedence over 404/403 in
/// the authorization ordering.
///
/// Resolution: `sid` cookie → session identity → repository lookup. The
/// final lookup re-verifies the user still exists, so a session bound to
/// a vanished user is rejected rather than trusted.
///
/// Rejection: 401 Unauthorized on any failure.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let repo = RepositoryState::from_ref(state);

        let sid = cookie_value(&parts.headers, SESSION_COOKIE)
            .ok_or(ApiError::AuthenticationRequired)?;
        let user_id = store
            .identity(&sid)
            .ok_or(ApiError::AuthenticationRequired)?;
        let user = repo
            .get_user(user_id)
            .await
            .ok_or(ApiError::AuthenticationRequired)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

/// csrf_guard
///
/// Anti-forgery middleware for the session-bootstrap path (POST
/// /api/signup). Compares the `X-CSRFToken` request header against the
/// token bound to the caller's session and fails closed with 403 before
/// the body is parsed or the handler runs. Routes are opted in explicitly
/// via `route_layer`, so an unsupported method still yields 405 first.
pub async fn csrf_guard(session: SessionContext, request: Request, next: Next) -> Response {
    let submitted = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());

    match (submitted, session.csrf_token()) {
        (Some(header), Some(bound)) if header == bound => next.run(request).await,
        _ => ApiError::CsrfRejected.into_response(),
    }
}
