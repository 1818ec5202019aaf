use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use dequorum_api::{build_router, config::Config, AppState};
use dequorum_persist::{ForumStore, MemoryForumStore, NewThread};

const USER_HEADER: &str = "x-forum-user";

fn test_config() -> Config {
    toml::from_str(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [cors]
        enabled = false
        origins = []

        [storage]
        backend = "memory"

        [mongodb]
        database = "test"
        pool_size = 1
        timeout_ms = 1000

        [auth]
        user_header = "x-forum-user"
        login_url = "/accounts/login"

        [logging]
        level = "debug"
        format = "pretty"
        "#,
    )
    .unwrap()
}

/// Router over a fresh store with tags rust=1, web=2, go=3
async fn setup() -> (Router, Arc<MemoryForumStore>) {
    let store = Arc::new(MemoryForumStore::with_tags(&["rust", "web", "go"]).await.unwrap());
    let state = Arc::new(AppState::new(test_config(), store.clone()));
    (build_router(state), store)
}

async fn seed_thread(store: &MemoryForumStore, title: &str, tag_ids: &[&str]) -> String {
    let ids: Vec<String> = tag_ids.iter().map(|id| id.to_string()).collect();
    let tags = store.get_tags(&ids).await.unwrap();
    let (thread, _) = store
        .create_thread(NewThread {
            owner_id: "seed".to_string(),
            title: title.to_string(),
            tags,
            first_message: format!("about {}", title),
        })
        .await
        .unwrap();
    thread.id
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, user: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn titles(page: &Value) -> Vec<String> {
    page["page"]["threads"]
        .as_array()
        .unwrap()
        .iter()
        .map(|thread| thread["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_and_tags() {
    let (app, _) = setup().await;

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "connected");

    let body = json_body(send(&app, get("/tags", None)).await).await;
    let names: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["go", "rust", "web"]);
}

#[tokio::test]
async fn test_empty_listing_is_a_single_empty_page() {
    let (app, _) = setup().await;

    let response = send(&app, get("/threads?page=5", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"]["number"], 1);
    assert_eq!(body["page"]["num_pages"], 1);
    assert_eq!(body["page"]["count"], 0);
    assert!(titles(&body).is_empty());
    assert_eq!(body["available_tags"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_thread_then_view_it() {
    let (app, store) = setup().await;

    let response = send(
        &app,
        post_form(
            "/threads/create",
            Some("alice"),
            "title=Lifetimes&body=How+do+they+work%3F&tag=1&tag=2",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/threads/1");
    assert_eq!(store.counts().await, (1, 1));

    let response = send(&app, get("/threads/1", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["thread"]["thread_id"], "1");
    assert_eq!(body["thread"]["owner_id"], "alice");
    assert_eq!(body["thread"]["title"], "Lifetimes");
    assert_eq!(body["thread"]["tags"], serde_json::json!(["rust", "web"]));
    assert_eq!(body["message_count"], 1);
    assert_eq!(body["messages"][0]["author_id"], "alice");
    assert_eq!(body["messages"][0]["thread_id"], "1");
    assert_eq!(body["messages"][0]["body"], "How do they work?");
    assert_eq!(body["form"]["body"], "");
}

#[tokio::test]
async fn test_create_requires_login() {
    let (app, store) = setup().await;

    let response = send(&app, get("/threads/create", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login?next=%2Fthreads%2Fcreate");

    let response = send(&app, post_form("/threads/create", None, "title=t&body=b")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/accounts/login?next="));
    assert_eq!(store.counts().await, (0, 0));
}

#[tokio::test]
async fn test_create_form_is_empty() {
    let (app, _) = setup().await;

    let response = send(&app, get("/threads/create", Some("alice"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["thread_form"]["title"], "");
    assert_eq!(body["message_form"]["body"], "");
    assert_eq!(body["tag_form"]["tag"], serde_json::json!([]));
    assert_eq!(body["thread_form"]["errors"], serde_json::json!({}));
}

#[tokio::test]
async fn test_invalid_message_creates_nothing() {
    let (app, store) = setup().await;

    let response = send(
        &app,
        post_form("/threads/create", Some("alice"), "title=Kept+title&body=+++&tag=1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["message_form"]["errors"]["body"][0], "This field is required.");
    assert_eq!(body["thread_form"]["title"], "Kept title");
    assert_eq!(body["thread_form"]["errors"], serde_json::json!({}));
    assert_eq!(body["tag_form"]["tag"], serde_json::json!(["1"]));
    assert_eq!(store.counts().await, (0, 0));
}

#[tokio::test]
async fn test_unknown_tag_creates_nothing() {
    let (app, store) = setup().await;

    let response = send(
        &app,
        post_form("/threads/create", Some("alice"), "title=t&body=b&tag=42"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(
        body["tag_form"]["errors"]["tag"][0],
        "Select a valid choice. 42 is not one of the available choices."
    );
    assert_eq!(store.counts().await, (0, 0));
}

#[tokio::test]
async fn test_non_form_body_is_rejected() {
    let (app, store) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/threads/create")
        .header(USER_HEADER, "alice")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"t","body":"b"}"#))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.counts().await, (0, 0));
}

#[tokio::test]
async fn test_missing_and_hidden_threads_are_both_not_found() {
    let (app, store) = setup().await;
    let hidden = seed_thread(&store, "hidden", &[]).await;
    assert!(store.hide_thread(&hidden).await);

    for uri in ["/threads/999".to_string(), format!("/threads/{}", hidden)] {
        let response = send(&app, get(&uri, Some("alice"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);

        let response = send(&app, post_form(&uri, Some("alice"), "body=hi")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
    assert_eq!(store.counts().await, (1, 1));
}

#[tokio::test]
async fn test_reply_redirects_back_to_thread() {
    let (app, store) = setup().await;
    let thread_id = seed_thread(&store, "replies", &[]).await;
    let uri = format!("/threads/{}", thread_id);

    let response = send(&app, post_form(&uri, Some("bob"), "body=First+reply")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), uri);
    assert_eq!(store.counts().await, (1, 2));

    let body = json_body(send(&app, get(&uri, None)).await).await;
    assert_eq!(body["message_count"], 2);
    assert_eq!(body["messages"][1]["author_id"], "bob");
    assert_eq!(body["messages"][1]["body"], "First reply");
    assert!(body["form"].is_null());
}

#[tokio::test]
async fn test_invalid_reply_returns_populated_form() {
    let (app, store) = setup().await;
    let thread_id = seed_thread(&store, "replies", &[]).await;
    let uri = format!("/threads/{}", thread_id);

    let response = send(&app, post_form(&uri, Some("bob"), "body=")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["form"]["errors"]["body"][0], "This field is required.");
    assert_eq!(body["message_count"], 1);
    assert_eq!(store.counts().await, (1, 1));
}

#[tokio::test]
async fn test_anonymous_reply_is_ignored() {
    let (app, store) = setup().await;
    let thread_id = seed_thread(&store, "replies", &[]).await;

    let response = send(
        &app,
        post_form(&format!("/threads/{}", thread_id), None, "body=drive-by"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["form"].is_null());
    assert_eq!(store.counts().await, (1, 1));
}

#[tokio::test]
async fn test_hidden_messages_are_not_shown() {
    let (app, store) = setup().await;
    let thread_id = seed_thread(&store, "moderated", &[]).await;
    let uri = format!("/threads/{}", thread_id);

    send(&app, post_form(&uri, Some("mallory"), "body=spam")).await;
    send(&app, post_form(&uri, Some("bob"), "body=welcome")).await;
    assert!(store.hide_message("2").await);

    let body = json_body(send(&app, get(&uri, None)).await).await;
    assert_eq!(body["message_count"], 2);
    let bodies: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["about moderated", "welcome"]);
}

#[tokio::test]
async fn test_listing_filters_by_path_and_query_tags() {
    let (app, store) = setup().await;
    seed_thread(&store, "rust web", &["1", "2"]).await;
    seed_thread(&store, "rust", &["1"]).await;
    seed_thread(&store, "go web", &["3", "2"]).await;
    seed_thread(&store, "untagged", &[]).await;

    // AND over path segments
    let body = json_body(send(&app, get("/threads/tagged/rust/web", None)).await).await;
    assert_eq!(titles(&body), vec!["rust web"]);
    assert_eq!(body["path_tags"], serde_json::json!(["rust", "web"]));

    // empty segments are dropped
    let body = json_body(send(&app, get("/threads/tagged/web//", None)).await).await;
    assert_eq!(titles(&body), vec!["go web", "rust web"]);

    // OR over query ids
    let body = json_body(send(&app, get("/threads?tag=1&tag=3", None)).await).await;
    assert_eq!(titles(&body), vec!["go web", "rust", "rust web"]);
    assert_eq!(body["tag_form"]["tag"], serde_json::json!(["1", "3"]));

    // AND first, then OR
    let body = json_body(send(&app, get("/threads/tagged/web?tag=3", None)).await).await;
    assert_eq!(titles(&body), vec!["go web"]);

    // no selection, no OR filter
    let body = json_body(send(&app, get("/threads?tag=", None)).await).await;
    assert_eq!(body["page"]["count"], 4);
}

#[tokio::test]
async fn test_empty_tag_path_lists_everything() {
    let (app, store) = setup().await;
    seed_thread(&store, "rust", &["1"]).await;
    seed_thread(&store, "untagged", &[]).await;

    for uri in ["/threads/tagged", "/threads/tagged/", "/threads/tagged///"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(titles(&body), vec!["untagged", "rust"], "{}", uri);
        assert_eq!(body["path_tags"], serde_json::json!([]), "{}", uri);
    }

    // segments are trimmed before matching
    let body = json_body(send(&app, get("/threads/tagged/%20rust%20/", None)).await).await;
    assert_eq!(body["path_tags"], serde_json::json!(["rust"]));
    assert_eq!(titles(&body), vec!["rust"]);
}

#[tokio::test]
async fn test_invalid_query_tag_is_reported_and_ignored() {
    let (app, store) = setup().await;
    seed_thread(&store, "rust", &["1"]).await;
    seed_thread(&store, "untagged", &[]).await;

    let response = send(&app, get("/threads?tag=1&tag=nope", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"]["count"], 2);
    assert_eq!(
        body["tag_form"]["errors"]["tag"][0],
        "Select a valid choice. nope is not one of the available choices."
    );
}

#[tokio::test]
async fn test_listing_hides_moderated_threads() {
    let (app, store) = setup().await;
    seed_thread(&store, "visible", &[]).await;
    let hidden = seed_thread(&store, "hidden", &[]).await;
    store.hide_thread(&hidden).await;

    let body = json_body(send(&app, get("/threads", None)).await).await;
    assert_eq!(titles(&body), vec!["visible"]);
}

#[tokio::test]
async fn test_pagination_clamps_every_input() {
    let (app, store) = setup().await;
    for n in 1..=25 {
        seed_thread(&store, &format!("thread {:02}", n), &[]).await;
    }

    let cases = [
        ("/threads", 1),
        ("/threads?page=abc", 1),
        ("/threads?page=2", 2),
        ("/threads?page=0", 3),
        ("/threads?page=-1", 3),
        ("/threads?page=99", 3),
        ("/threads?page=99999999999999999999", 3),
    ];
    for (uri, expected) in cases {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["page"]["number"], expected, "{}", uri);
        assert_eq!(body["page"]["num_pages"], 3, "{}", uri);
    }

    // newest first, ten per page
    let first = json_body(send(&app, get("/threads", None)).await).await;
    let first_titles = titles(&first);
    assert_eq!(first_titles.len(), 10);
    assert_eq!(first_titles[0], "thread 25");
    assert_eq!(first["page"]["has_next"], true);
    assert_eq!(first["page"]["has_previous"], false);

    let last = json_body(send(&app, get("/threads?page=3", None)).await).await;
    assert_eq!(titles(&last), vec!["thread 05", "thread 04", "thread 03", "thread 02", "thread 01"]);
    assert_eq!(last["page"]["has_next"], false);
}
