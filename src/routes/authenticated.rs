use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes the `AuthUser` extractor, which resolves the
/// session identity and rejects anonymous callers with 401. Authorization
/// beyond authentication (existence, then ownership) is applied inside
/// the handlers in that fixed order.
///
/// Enforcement lives in the extractor rather than a router-wide layer so
/// that method routing still wins: an unsupported method on any of these
/// paths is 405 even for an anonymous caller.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/signout
        // Clears the identity binding. 401 when none is bound.
        .route("/api/signout", get(handlers::signout))
        // GET/POST /api/article
        // Collection access: full listing, and creation with the caller
        // as author.
        .route(
            "/api/article",
            get(handlers::list_articles).post(handlers::create_article),
        )
        // GET/PUT/DELETE /api/article/{id}
        // Detail access. PUT/DELETE are author-only; DELETE cascades to
        // the article's comments.
        .route(
            "/api/article/{id}",
            get(handlers::article_detail)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        // GET/POST /api/article/{id}/comment
        // Comments nested under an article; 404 when the article is gone.
        .route(
            "/api/article/{id}/comment",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        // GET/PUT/DELETE /api/comment/{id}
        // Comment detail access, author-only mutation.
        .route(
            "/api/comment/{id}",
            get(handlers::comment_detail)
                .put(handlers::update_comment)
                .delete(handlers::delete_comment),
        )
}
