use blog_portal::{
    AppConfig, AppState, MemoryRepository, MockHasher, create_router,
    auth::SessionStore,
    credentials::HasherState,
    models::Article,
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Spawns the application with the mock hasher; these tests exercise the
/// authorization ordering, not the credential path.
async fn spawn_app() -> String {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        sessions: SessionStore::new(),
        hasher: Arc::new(MockHasher::new()) as HasherState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Runs the full handshake for a fresh user and returns a signed-in client
/// whose cookie jar carries the session.
async fn signed_in_client(address: &str, username: &str) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("client build failed");

    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    let csrftoken = response
        .cookies()
        .find(|c| c.name() == "csrftoken")
        .expect("csrftoken cookie missing")
        .value()
        .to_string();

    let response = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .json(&serde_json::json!({"username": username, "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{address}/api/signin"))
        .json(&serde_json::json!({"username": username, "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    client
}

#[tokio::test]
async fn test_article_lifecycle() {
    let address = spawn_app().await;
    let client = signed_in_client(&address, "swpp").await;

    // Create
    let response = client
        .post(format!("{address}/api/article"))
        .json(&serde_json::json!({"title": "First", "content": "Olleh!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Ids are monotonic per type, so the first article is id 1.
    let response = client.get(format!("{address}/api/article/1")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Olleh!"));

    // Update round-trip: the replacement is reflected exactly.
    let response = client
        .put(format!("{address}/api/article/1"))
        .json(&serde_json::json!({"title": "First", "content": "Woo!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let article: Article = client
        .get(format!("{address}/api/article/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(article.title, "First");
    assert_eq!(article.content, "Woo!");
    assert_eq!(article.author, 1);

    // Delete returns 200 (deliberately not 204); the record is then gone.
    let response = client.delete(format!("{address}/api/article/1")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let response = client.get(format!("{address}/api/article/1")).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_article_listing() {
    let address = spawn_app().await;
    let client = signed_in_client(&address, "swpp").await;

    for (title, content) in [("I Love SWPP!", "Believe it or not"), ("Second", "Yeah!")] {
        let response = client
            .post(format!("{address}/api/article"))
            .json(&serde_json::json!({"title": title, "content": content}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = client.get(format!("{address}/api/article")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let articles: Vec<Article> = response.json().await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id, 1);
    assert_eq!(articles[1].id, 2);
    // The author is exposed as a bare identifier.
    assert!(articles.iter().all(|a| a.author == 1));
}

#[tokio::test]
async fn test_unauthenticated_requests_are_401_even_for_missing_ids() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Authentication precedes existence: id 999 does not exist, but the
    // anonymous caller must see 401, not 404.
    let response = client.get(format!("{address}/api/article")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client.get(format!("{address}/api/article/999")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .put(format!("{address}/api/article/999"))
        .json(&serde_json::json!({"title": "t", "content": "c"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client.delete(format!("{address}/api/article/999")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{address}/api/article"))
        .json(&serde_json::json!({"title": "t", "content": "c"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_missing_article_is_404_for_authenticated_callers() {
    let address = spawn_app().await;
    let client = signed_in_client(&address, "swpp").await;

    let response = client.get(format!("{address}/api/article/999")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .put(format!("{address}/api/article/999"))
        .json(&serde_json::json!({"title": "t", "content": "c"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client.delete(format!("{address}/api/article/999")).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_foreign_article_mutation_is_403() {
    let address = spawn_app().await;
    let author = signed_in_client(&address, "alice").await;
    let intruder = signed_in_client(&address, "bob").await;

    let response = author
        .post(format!("{address}/api/article"))
        .json(&serde_json::json!({"title": "Mine", "content": "Keep out"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Ownership is checked after existence: the article exists, so the
    // non-owner sees 403, not 404.
    let response = intruder
        .put(format!("{address}/api/article/1"))
        .json(&serde_json::json!({"title": "Stolen", "content": "Mwahaha"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = intruder.delete(format!("{address}/api/article/1")).send().await.unwrap();
    assert_eq!(response.status(), 403);

    // Reading someone else's article is allowed, and it is unchanged.
    let article: Article = intruder
        .get(format!("{address}/api/article/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(article.title, "Mine");
    assert_eq!(article.content, "Keep out");
}

#[tokio::test]
async fn test_unsupported_methods_are_405() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // 405 is decided by method routing before any auth logic, so even an
    // anonymous caller sees it.
    let response = client.patch(format!("{address}/api/article/1")).send().await.unwrap();
    assert_eq!(response.status(), 405);
    let allow = response
        .headers()
        .get("allow")
        .expect("Allow header missing")
        .to_str()
        .unwrap();
    assert!(allow.contains("GET"));
    assert!(allow.contains("PUT"));
    assert!(allow.contains("DELETE"));

    let response = client.delete(format!("{address}/api/article")).send().await.unwrap();
    assert_eq!(response.status(), 405);
}
