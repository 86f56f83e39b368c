use crate::{
    AppState,
    auth::{self, AuthUser, SessionContext},
    error::ApiError,
    models::{Article, ArticlePayload, Comment, CommentPayload, CredentialsRequest},
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};

// --- Session Handlers ---

/// signup
///
/// [CSRF-Guarded Route] Creates a new user. The `csrf_guard` middleware has
/// already matched the `X-CSRFToken` header against the session-bound token
/// before the body is parsed; this handler only hashes and stores.
///
/// Duplicate usernames are a client error (400), not a fault.
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Username taken"),
        (status = 403, description = "CSRF token missing or invalid")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<StatusCode, ApiError> {
    let password_hash = state.hasher.hash(&payload.password).map_err(|e| {
        tracing::error!("password hashing failed: {e}");
        ApiError::Internal
    })?;

    state
        .repo
        .create_user(&payload.username, &password_hash)
        .await
        .ok_or_else(|| ApiError::BadRequest("username already taken".to_string()))?;

    tracing::info!(username = %payload.username, "user signed up");
    Ok(StatusCode::CREATED)
}

/// token
///
/// [Public Route] Issues (or refreshes) the anti-forgery token bound to the
/// caller's session and delivers it via the `csrftoken` cookie, alongside
/// the session id cookie itself. Responds 204 with no body.
#[utoipa::path(
    get,
    path = "/api/token",
    responses((status = 204, description = "CSRF cookie set"))
)]
pub async fn token(session: SessionContext, State(state): State<AppState>) -> impl IntoResponse {
    let csrf = session.issue_csrf();
    let secure = state.config.cookie_secure;
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([
            (header::SET_COOKIE, auth::session_cookie(&session.sid, secure)),
            (header::SET_COOKIE, auth::csrf_cookie(&csrf, secure)),
        ]),
    )
}

/// signin
///
/// [Public Route] Verifies the submitted credentials against the stored
/// hash and binds the identity to the caller's session. Bad credentials
/// yield 401; whether the username or the password was wrong is not
/// distinguished.
#[utoipa::path(
    post,
    path = "/api/signin",
    request_body = CredentialsRequest,
    responses(
        (status = 204, description = "Session established"),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn signin(
    session: SessionContext,
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await
        .ok_or(ApiError::AuthenticationRequired)?;

    if !state.hasher.verify(&payload.password, &user.password_hash) {
        return Err(ApiError::AuthenticationRequired);
    }

    session.establish(user.id);
    tracing::info!(username = %user.username, "session established");

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(
            header::SET_COOKIE,
            auth::session_cookie(&session.sid, state.config.cookie_secure),
        )]),
    ))
}

/// signout
///
/// [Authenticated Route] Clears the identity binding for the caller's
/// session. The `AuthUser` extractor has already rejected anonymous
/// callers with 401.
#[utoipa::path(
    get,
    path = "/api/signout",
    responses(
        (status = 204, description = "Session terminated"),
        (status = 401, description = "No identity bound")
    )
)]
pub async fn signout(user: AuthUser, session: SessionContext) -> StatusCode {
    session.terminate();
    tracing::info!(username = %user.username, "session terminated");
    StatusCode::NO_CONTENT
}

// --- Article Handlers ---

/// list_articles
///
/// [Authenticated Route] Lists every article.
#[utoipa::path(
    get,
    path = "/api/article",
    responses(
        (status = 200, description = "All articles", body = [Article]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_articles(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Article>> {
    Json(state.repo.list_articles().await)
}

/// create_article
///
/// [Authenticated Route] Creates an article with the caller as author.
/// The author comes from the resolved session identity, never the payload.
#[utoipa::path(
    post,
    path = "/api/article",
    request_body = ArticlePayload,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ArticlePayload>,
) -> impl IntoResponse {
    let article = state
        .repo
        .create_article(user.id, payload.title, payload.content)
        .await;
    (StatusCode::CREATED, Json(article))
}

/// article_detail
///
/// [Authenticated Route] Retrieves a single article. Authentication has
/// already been checked by the extractor, so a missing id is 404 here.
#[utoipa::path(
    get,
    path = "/api/article/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such article")
    )
)]
pub async fn article_detail(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    let article = state.repo.get_article(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(article))
}

/// update_article
///
/// [Authenticated Route] Whole-record replace of title and content,
/// allowed only for the article's author. Ordering is fixed:
/// existence (404) is checked before ownership (403).
#[utoipa::path(
    put,
    path = "/api/article/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = ArticlePayload,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such article")
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Json<Article>, ApiError> {
    let article = state.repo.get_article(id).await.ok_or(ApiError::NotFound)?;
    if article.author != user.id {
        return Err(ApiError::OwnershipViolation);
    }

    let updated = state
        .repo
        .update_article(id, payload.title, payload.content)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_article
///
/// [Authenticated Route] Deletes an article and, atomically with it, every
/// comment under it. Author-only. Deletion returns 200 with an empty body
/// rather than 204.
#[utoipa::path(
    delete,
    path = "/api/article/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted (comments cascaded)"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such article")
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let article = state.repo.get_article(id).await.ok_or(ApiError::NotFound)?;
    if article.author != user.id {
        return Err(ApiError::OwnershipViolation);
    }

    if state.repo.delete_article(id).await {
        Ok(StatusCode::OK)
    } else {
        // Lost a delete race after the ownership check.
        Err(ApiError::NotFound)
    }
}

// --- Comment Handlers ---

/// list_comments
///
/// [Authenticated Route] Lists the comments under one article. Listing
/// against a nonexistent article is 404, consistent with the article
/// detail endpoint's existence check.
#[utoipa::path(
    get,
    path = "/api/article/{id}/comment",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Comments for the article", body = [Comment]),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such article")
    )
)]
pub async fn list_comments(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    state
        .repo
        .get_article(article_id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(state.repo.list_comments(article_id).await))
}

/// create_comment
///
/// [Authenticated Route] Posts a comment under an existing article, with
/// the caller as author. The repository enforces that the article exists
/// inside the same critical section that inserts the comment.
#[utoipa::path(
    post,
    path = "/api/article/{id}/comment",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such article")
    )
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .repo
        .create_comment(article_id, user.id, payload.content)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// comment_detail
///
/// [Authenticated Route] Retrieves a single comment by its own id.
#[utoipa::path(
    get,
    path = "/api/comment/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Found", body = Comment),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such comment")
    )
)]
pub async fn comment_detail(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(comment))
}

/// update_comment
///
/// [Authenticated Route] Replaces a comment's content, author-only.
#[utoipa::path(
    put,
    path = "/api/comment/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentPayload,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such comment")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CommentPayload>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    if comment.author != user.id {
        return Err(ApiError::OwnershipViolation);
    }

    let updated = state
        .repo
        .update_comment(id, payload.content)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment, author-only. Returns 200 with
/// an empty body on success.
#[utoipa::path(
    delete,
    path = "/api/comment/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such comment")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    if comment.author != user.id {
        return Err(ApiError::OwnershipViolation);
    }

    if state.repo.delete_comment(id).await {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound)
    }
}
