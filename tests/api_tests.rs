use blog_portal::{
    AppConfig, AppState, Argon2Hasher, MemoryRepository, create_router,
    auth::SessionStore,
    credentials::HasherState,
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Spawns the full application on an ephemeral port with the real Argon2
/// hasher, so the session handshake tests exercise the production path.
async fn spawn_app() -> String {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        sessions: SessionStore::new(),
        hasher: Arc::new(Argon2Hasher::new()) as HasherState,
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

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("client build failed")
}

fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

#[tokio::test]
async fn test_health_check() {
    let address = spawn_app().await;
    let response = client()
        .get(format!("{address}/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_csrf_handshake() {
    let address = spawn_app().await;
    let client = client();

    // Without a csrf token the signup is rejected before the body matters.
    let response = client
        .post(format!("{address}/api/signup"))
        .json(&serde_json::json!({"username": "chris", "password": "chris"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Obtain the token; it arrives as a cookie on a 204.
    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    assert_eq!(response.status(), 204);
    let csrftoken = cookie_value(&response, "csrftoken").expect("csrftoken cookie missing");

    // Echoing the token in the header passes the guard.
    let response = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .json(&serde_json::json!({"username": "chris", "password": "chris"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_csrf_token_must_match_the_session() {
    let address = spawn_app().await;
    let client = client();

    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    assert!(cookie_value(&response, "csrftoken").is_some());

    // A fabricated header value is rejected even though a token was issued.
    let response = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", "not-the-issued-token")
        .json(&serde_json::json!({"username": "eve", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_duplicate_username_is_a_client_error() {
    let address = spawn_app().await;
    let client = client();

    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    let csrftoken = cookie_value(&response, "csrftoken").unwrap();

    let first = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .json(&serde_json::json!({"username": "swpp", "password": "iluvswpp"}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .json(&serde_json::json!({"username": "swpp", "password": "other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 400);
}

#[tokio::test]
async fn test_signin_and_signout_flow() {
    let address = spawn_app().await;
    let client = client();

    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    let csrftoken = cookie_value(&response, "csrftoken").unwrap();

    let response = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .json(&serde_json::json!({"username": "swpp", "password": "iluvswpp"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Wrong password first: no session may be established.
    let response = client
        .post(format!("{address}/api/signin"))
        .json(&serde_json::json!({"username": "swpp", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Signin does not require the csrf header.
    let response = client
        .post(format!("{address}/api/signin"))
        .json(&serde_json::json!({"username": "swpp", "password": "iluvswpp"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client.get(format!("{address}/api/signout")).send().await.unwrap();
    assert_eq!(response.status(), 204);

    // The binding is gone, so a second signout is 401.
    let response = client.get(format!("{address}/api/signout")).send().await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_signin_unknown_user_is_401() {
    let address = spawn_app().await;
    let response = client()
        .post(format!("{address}/api/signin"))
        .json(&serde_json::json!({"username": "ghost", "password": "boo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_signout_without_session_is_401() {
    let address = spawn_app().await;
    let response = client()
        .get(format!("{address}/api/signout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_method_routing_wins_over_guards() {
    let address = spawn_app().await;
    let client = client();

    // GET on the signup route is 405, not 403: method routing is checked
    // before the csrf guard.
    let response = client.get(format!("{address}/api/signup")).send().await.unwrap();
    assert_eq!(response.status(), 405);
    let allow = response.headers().get("allow").expect("Allow header missing");
    assert!(allow.to_str().unwrap().contains("POST"));

    let response = client.post(format!("{address}/api/token")).send().await.unwrap();
    assert_eq!(response.status(), 405);

    let response = client.delete(format!("{address}/api/signin")).send().await.unwrap();
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_malformed_signup_body_is_a_client_error() {
    let address = spawn_app().await;
    let client = client();

    let response = client.get(format!("{address}/api/token")).send().await.unwrap();
    let csrftoken = cookie_value(&response, "csrftoken").unwrap();

    let response = client
        .post(format!("{address}/api/signup"))
        .header("X-CSRFToken", &csrftoken)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
