//! End-to-end tests driving the HTTP API over a real socket.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use dartscore::{server, AppState, Config, Dart, Storage};

struct TestServer {
    addr: SocketAddr,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    async fn start_with(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(Storage::open_in_memory().unwrap(), config);

        tokio::spawn(server::serve(listener, state, std::future::pending()));

        Self {
            addr,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn create(&self, body: Value) -> Dart {
        let resp = self
            .client
            .post(self.url("/api/v1/darts"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn detail(resp: reqwest::Response) -> String {
        let body: Value = resp.json().await.unwrap();
        body["detail"].as_str().unwrap().to_string()
    }
}

fn player(username: &str) -> Value {
    json!({
        "username": username,
        "game": "cricket",
        "game_type": "practice",
        "throws": 42,
        "score": 301
    })
}

#[tokio::test]
async fn test_info_describes_service() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/v1/darts/info"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "dartscore");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["api_version"], "v1");
    assert_eq!(body["docs_url"], "/api/v1/darts/docs");
    assert_eq!(body["storage"], "sqlite");
}

#[tokio::test]
async fn test_health_reports_record_count() {
    let server = TestServer::start().await;
    server.create(player("alice")).await;

    let resp = server
        .client
        .get(server.url("/api/v1/darts/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["records"], 1);
}

#[tokio::test]
async fn test_create_then_get() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&player("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let created: Dart = resp.json().await.unwrap();

    assert_eq!(location, format!("/api/v1/darts/{}", created.id));
    assert_eq!(created.username, "alice");
    assert_eq!(created.throws, Some(42));
    assert_eq!(created.score, Some(301));
    assert_eq!(created.create_date, created.update_date);

    let fetched: Dart = server
        .client
        .get(server.url(&location))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_without_optional_fields() {
    let server = TestServer::start().await;

    let created = server
        .create(json!({"username": "bob", "game": "501", "game_type": "league"}))
        .await;
    assert_eq!(created.throws, None);
    assert_eq!(created.score, None);
}

#[tokio::test]
async fn test_create_duplicate_username_conflicts() {
    let server = TestServer::start().await;
    server.create(player("alice")).await;

    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&player("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(TestServer::detail(resp).await.contains("alice"));
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let server = TestServer::start().await;

    let mut blank = player("carol");
    blank["game"] = json!("   ");
    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&blank)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(TestServer::detail(resp).await.contains("game"));

    let mut negative = player("carol");
    negative["score"] = json!(-1);
    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&negative)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let too_long = player(&"x".repeat(51));
    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&too_long)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_with_missing_field_is_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .json(&json!({"username": "dave"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!TestServer::detail(resp).await.is_empty());
}

#[tokio::test]
async fn test_create_with_malformed_json_is_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/v1/darts"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_get_missing_record() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/v1/darts/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        TestServer::detail(resp).await,
        "darts with id 999 not found"
    );
}

#[tokio::test]
async fn test_get_with_non_numeric_id() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/v1/darts/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_put_replaces_record() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;

    tokio::time::sleep(Duration::from_millis(5)).await;

    let resp = server
        .client
        .put(server.url(&format!("/api/v1/darts/{}", created.id)))
        .json(&json!({"username": "alice", "game": "501", "game_type": "league"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Dart = resp.json().await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.game, "501");
    assert_eq!(updated.game_type, "league");
    assert_eq!(updated.throws, None);
    assert_eq!(updated.score, None);
    assert_eq!(updated.create_date, created.create_date);
    assert!(updated.update_date > created.update_date);
}

#[tokio::test]
async fn test_put_missing_record() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .put(server.url("/api/v1/darts/7"))
        .json(&player("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_to_taken_username_conflicts() {
    let server = TestServer::start().await;
    server.create(player("alice")).await;
    let bob = server.create(player("bob")).await;

    let resp = server
        .client
        .put(server.url(&format!("/api/v1/darts/{}", bob.id)))
        .json(&player("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_patch_updates_only_given_fields() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;

    let resp = server
        .client
        .patch(server.url(&format!("/api/v1/darts/{}", created.id)))
        .json(&json!({"score": 180}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Dart = resp.json().await.unwrap();

    assert_eq!(patched.score, Some(180));
    assert_eq!(patched.throws, Some(42));
    assert_eq!(patched.username, "alice");
    assert_eq!(patched.game, "cricket");
    assert_eq!(patched.create_date, created.create_date);
}

#[tokio::test]
async fn test_patch_null_clears_value() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;

    let patched: Dart = server
        .client
        .patch(server.url(&format!("/api/v1/darts/{}", created.id)))
        .json(&json!({"throws": null}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(patched.throws, None);
    assert_eq!(patched.score, Some(301));
}

#[tokio::test]
async fn test_patch_rejects_invalid_value() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;

    let resp = server
        .client
        .patch(server.url(&format!("/api/v1/darts/{}", created.id)))
        .json(&json!({"username": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unchanged: Dart = server
        .client
        .get(server.url(&format!("/api/v1/darts/{}", created.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_patch_null_required_field_is_rejected() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;
    let url = server.url(&format!("/api/v1/darts/{}", created.id));

    for field in ["username", "game", "game_type"] {
        let resp = server
            .client
            .patch(&url)
            .json(&json!({ (field): null }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{field}");
        assert!(TestServer::detail(resp).await.contains(field));
    }

    let unchanged: Dart = server
        .client
        .get(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_patch_missing_record() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .patch(server.url("/api/v1/darts/3"))
        .json(&json!({"score": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let server = TestServer::start().await;
    let created = server.create(player("alice")).await;
    let url = server.url(&format!("/api/v1/darts/{}", created.id));

    let resp = server.client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        TestServer::detail(resp).await,
        format!("darts with id {} deleted successfully", created.id)
    );

    let resp = server.client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server.client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_omits_deleted_records() {
    let server = TestServer::start().await;
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(server.create(player(&format!("player{i}"))).await.id);
    }

    let resp = server
        .client
        .delete(server.url(&format!("/api/v1/darts/{}", ids[1])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let listed: Vec<Dart> = server
        .client
        .get(server.url("/api/v1/darts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed_ids: Vec<i64> = listed.iter().map(|d| d.id).collect();
    assert_eq!(listed_ids, [ids[0], ids[2]]);
}

#[tokio::test]
async fn test_list_is_ordered_and_paginated() {
    let server = TestServer::start().await;
    for i in 0..5 {
        server.create(player(&format!("player{i}"))).await;
    }

    let all: Vec<Dart> = server
        .client
        .get(server.url("/api/v1/darts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    let second: Vec<Dart> = server
        .client
        .get(server.url("/api/v1/darts?page=2&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<_> = second.iter().map(|d| d.username.as_str()).collect();
    assert_eq!(names, ["player2", "player3"]);

    let past_end: Vec<Dart> = server
        .client
        .get(server.url("/api/v1/darts?page=10&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_list_uses_default_page_size() {
    let mut config = Config::default();
    config.api.default_page_size = 3;
    let server = TestServer::start_with(config).await;
    for i in 0..4 {
        server.create(player(&format!("player{i}"))).await;
    }

    let page: Vec<Dart> = server
        .client
        .get(server.url("/api/v1/darts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
}

#[tokio::test]
async fn test_list_rejects_out_of_range_params() {
    let server = TestServer::start().await;

    for query in ["page=0", "limit=0", "limit=1001"] {
        let resp = server
            .client
            .get(server.url(&format!("/api/v1/darts?{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{query}");
    }

    let resp = server
        .client
        .get(server.url("/api/v1/darts?page=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_docs_and_openapi_served() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/v1/darts/docs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().to_lowercase().contains("<html"));

    let document: Value = server
        .client
        .get(server.url("/api/v1/darts/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(document["paths"]["/api/v1/darts"].is_object());
    assert!(document["paths"]["/api/v1/darts/{id}"].is_object());
}

#[tokio::test]
async fn test_docs_disabled() {
    let mut config = Config::default();
    config.api.docs_enabled = false;
    let server = TestServer::start_with(config).await;

    for path in ["/api/v1/darts/docs", "/api/v1/darts/openapi.json"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(TestServer::detail(resp).await, "Not Found");
    }

    let info: Value = server
        .client
        .get(server.url("/api/v1/darts/info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(info["docs_url"].is_null());
}

#[tokio::test]
async fn test_test_page_served() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/darts/test/darts.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(TestServer::detail(resp).await, "Not Found");
}
