use crate::{AppState, auth, handlers};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a bound identity. These establish the
/// session/CSRF handshake that every later mutation depends on.
///
/// The CSRF guard sits on the signup method router via `route_layer`, so
/// it only runs when the method actually matches: a GET to /api/signup is
/// answered 405 by the method router before the guard is consulted.
pub fn public_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/signup
        // Creates a user. The only route requiring the X-CSRFToken header;
        // the guard compares it to the session-bound token from /api/token.
        .route(
            "/api/signup",
            post(handlers::signup)
                .route_layer(middleware::from_fn_with_state(state, auth::csrf_guard)),
        )
        // GET /api/token
        // Issues the anti-forgery token and session cookie. 204, no body.
        .route("/api/token", get(handlers::token))
        // POST /api/signin
        // Verifies credentials and binds the identity to the session.
        // Does not require the CSRF header.
        .route("/api/signin", post(handlers::signin))
}
