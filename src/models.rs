use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Core Application Schemas ---

/// User
///
/// The canonical identity record. Created once by signup and immutable
/// thereafter; there are no update or delete endpoints for users.
/// The password hash is a PHC-format string produced by the credential
/// hasher and is never serialized into a response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

/// Article
///
/// A blog article. `author` is the id of the user that created it and is
/// immutable after creation; title and content may only be replaced by
/// that user. Deleting an article cascades to every comment under it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    // FK to User.id (owner). Exposed as a bare identifier, never expanded.
    pub author: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A comment nested under an article. `article` must reference an article
/// that exists at creation time; the cascade delete on the parent article
/// guarantees no comment ever outlives it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct Comment {
    pub id: i64,
    // FK to Article.id.
    pub article: i64,
    pub content: String,
    // FK to User.id (owner).
    pub author: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CredentialsRequest
///
/// Input payload shared by POST /api/signup and POST /api/signin.
/// The password is hashed (signup) or verified (signin) and never stored
/// or logged in plain form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// ArticlePayload
///
/// Input payload for creating (POST /api/article) or replacing
/// (PUT /api/article/{id}) an article. The update is a whole-record
/// replace of title and content; the author never changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ArticlePayload {
    pub title: String,
    pub content: String,
}

/// CommentPayload
///
/// Input payload for creating or replacing a comment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CommentPayload {
    pub content: String,
}
