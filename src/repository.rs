use crate::models::{Article, Comment, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so the
/// handlers never depend on a concrete store. Entity lookups return
/// `Option` (absence is an expected outcome, translated to 404 by the
/// caller) and deletions return whether a row was removed.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Creates a user. Returns `None` when the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Option<User>;
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;

    // --- Articles ---
    async fn create_article(&self, author: i64, title: String, content: String) -> Article;
    async fn list_articles(&self) -> Vec<Article>;
    async fn get_article(&self, id: i64) -> Option<Article>;
    /// Whole-record replace of title and content; the author is unchanged.
    async fn update_article(&self, id: i64, title: String, content: String) -> Option<Article>;
    /// Removes the article and every comment referencing it, atomically.
    async fn delete_article(&self, id: i64) -> bool;

    // --- Comments ---
    /// Creates a comment. Returns `None` when the referenced article does
    /// not currently exist.
    async fn create_comment(&self, article_id: i64, author: i64, content: String)
    -> Option<Comment>;
    async fn list_comments(&self, article_id: i64) -> Vec<Comment>;
    async fn get_comment(&self, id: i64) -> Option<Comment>;
    async fn update_comment(&self, id: i64, content: String) -> Option<Comment>;
    async fn delete_comment(&self, id: i64) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Tables
///
/// The entire relational state behind one lock. Ids are monotonic per
/// table; `BTreeMap` keeps listings in insertion (id) order.
#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    articles: BTreeMap<i64, Article>,
    comments: BTreeMap<i64, Comment>,
    next_user_id: i64,
    next_article_id: i64,
    next_comment_id: i64,
}

/// MemoryRepository
///
/// The in-memory implementation of the `Repository` trait. A single
/// `RwLock` over all tables makes every operation a transaction: id
/// assignment is serialized, and the article-delete cascade happens under
/// the same write-lock acquisition as the article's own removal, so no
/// observer can see an article gone with its comments surviving. The lock
/// is never held across an await point.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Option<User> {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        if tables.users.values().any(|u| u.username == username) {
            return None;
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Some(user)
    }

    async fn get_user(&self, id: i64) -> Option<User> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables.users.get(&id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables.users.values().find(|u| u.username == username).cloned()
    }

    async fn create_article(&self, author: i64, title: String, content: String) -> Article {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        tables.next_article_id += 1;
        let now = Utc::now();
        let article = Article {
            id: tables.next_article_id,
            title,
            content,
            author,
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(article.id, article.clone());
        article
    }

    async fn list_articles(&self) -> Vec<Article> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables.articles.values().cloned().collect()
    }

    async fn get_article(&self, id: i64) -> Option<Article> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables.articles.get(&id).cloned()
    }

    async fn update_article(&self, id: i64, title: String, content: String) -> Option<Article> {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        let article = tables.articles.get_mut(&id)?;
        article.title = title;
        article.content = content;
        article.updated_at = Utc::now();
        Some(article.clone())
    }

    async fn delete_article(&self, id: i64) -> bool {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        if tables.articles.remove(&id).is_none() {
            return false;
        }
        // Cascade under the same lock: the article and its comments
        // disappear in one step.
        tables.comments.retain(|_, c| c.article != id);
        true
    }

    async fn create_comment(
        &self,
        article_id: i64,
        author: i64,
        content: String,
    ) -> Option<Comment> {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        // Referential integrity: the parent article must exist right now,
        // inside the same critical section that inserts the comment.
        if !tables.articles.contains_key(&article_id) {
            return None;
        }
        tables.next_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: tables.next_comment_id,
            article: article_id,
            content,
            author,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Some(comment)
    }

    async fn list_comments(&self, article_id: i64) -> Vec<Comment> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables
            .comments
            .values()
            .filter(|c| c.article == article_id)
            .cloned()
            .collect()
    }

    async fn get_comment(&self, id: i64) -> Option<Comment> {
        let tables = self.tables.read().expect("repository lock poisoned");
        tables.comments.get(&id).cloned()
    }

    async fn update_comment(&self, id: i64, content: String) -> Option<Comment> {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        let comment = tables.comments.get_mut(&id)?;
        comment.content = content;
        comment.updated_at = Utc::now();
        Some(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> bool {
        let mut tables = self.tables.write().expect("repository lock poisoned");
        tables.comments.remove(&id).is_some()
    }
}
