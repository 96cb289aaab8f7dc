use std::sync::Arc;

use api::auth::TokenTable;
use api::routes::HEALTH_TEXT;
use api::state::AppState;
use prep_core::time::fixed_now;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use services::{AppServices, Clock};
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let services = AppServices::in_memory(Clock::manual(fixed_now()), None).unwrap();
        let tokens = TokenTable::parse("alice:alice-token,bob:bob-token").unwrap();
        let app = api::router(AppState::new(&services, Arc::new(tokens)), None).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(token), Some(body))
            .await
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, Some(token), None).await
    }

    async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::DELETE, path, Some(token), None)
            .await
    }

    async fn create_session(&self, token: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/sessions/create",
                token,
                json!({
                    "role": "Backend Engineer",
                    "experienceLevel": "Mid",
                    "topicsToFocusOn": ["Node", "SQL"],
                    "questions": [{ "question": "What is indexing?", "answer": "..." }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["session"].clone()
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::start().await;
    let text = reqwest::get(server.url("/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, HEALTH_TEXT);
}

#[tokio::test]
async fn protected_routes_require_a_known_token() {
    let server = TestServer::start().await;

    let (status, body) = server
        .send(reqwest::Method::GET, "/api/sessions/my-sessions", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized");

    let (status, _) = server.get("/api/sessions/my-sessions", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let server = TestServer::start().await;
    let session = server.create_session("alice-token").await;
    let id = session["id"].as_str().unwrap().to_owned();
    assert_eq!(session["user"], "alice");
    assert_eq!(session["experienceLevel"], "Mid");
    assert_eq!(session["questions"].as_array().unwrap().len(), 1);
    assert_eq!(session["questions"][0]["isPinned"], false);
    assert_eq!(session["questions"][0]["note"], "");

    let (status, body) = server
        .post(
            "/api/questions/add",
            "alice-token",
            json!({
                "sessionId": id,
                "questions": [
                    { "question": "What is a transaction?", "answer": "..." },
                    { "question": "Explain the event loop", "answer": "..." }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["questions"].as_array().unwrap().len(), 2);

    let original = session["questions"][0]["id"].as_str().unwrap().to_owned();
    let (status, body) = server
        .post(&format!("/api/questions/{original}/pin"), "alice-token", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["isPinned"], true);

    let (status, body) = server
        .post(
            &format!("/api/questions/{original}/note"),
            "alice-token",
            json!({ "note": "mention B-trees" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["note"], "mention B-trees");

    let (status, body) = server.get(&format!("/api/sessions/{id}"), "alice-token").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let questions = body["session"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["id"], original.as_str());

    let (status, body) = server.get("/api/sessions/my-sessions", "alice-token").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    let (_, body) = server.get("/api/sessions/my-sessions", "bob-token").await;
    assert!(body["sessions"].as_array().unwrap().is_empty());

    let (status, body) = server.delete(&format!("/api/sessions/{id}"), "bob-token").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = server.delete(&format!("/api/sessions/{id}"), "alice-token").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session deleted");

    let (status, body) = server.get(&format!("/api/sessions/{id}"), "alice-token").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");

    let (status, _) = server
        .post(&format!("/api/questions/{original}/pin"), "alice-token", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_input_is_rejected_with_400() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post(
            "/api/sessions/create",
            "alice-token",
            json!({ "role": "Dev", "experienceLevel": "Wizard", "topicsToFocusOn": "Go" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post(
            "/api/sessions/create",
            "alice-token",
            json!({ "role": "Dev", "experienceLevel": "Junior", "topicsToFocusOn": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.get("/api/sessions/not-a-uuid", "alice-token").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post("/api/questions/add", "alice-token", json!({ "questions": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn append_to_missing_session_is_404() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/api/questions/add",
            "alice-token",
            json!({
                "sessionId": "7f0c1d52-1b7e-4b8c-9d7e-2f1a3c4b5d6e",
                "questions": [{ "question": "Q", "answer": "A" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn ai_routes_report_missing_configuration() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post(
            "/api/ai/generate-questions",
            "alice-token",
            json!({
                "role": "Dev",
                "experience": "2 years",
                "topicsToFocus": "Go, SQL",
                "numberOfQuestions": 5
            }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post(
            "/api/ai/generate-questions",
            "alice-token",
            json!({ "role": "Dev", "experience": "2 years", "topicsToFocus": "Go" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/api/ai/generate-explanation", "alice-token", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn note_post_without_body_clears_the_note() {
    let server = TestServer::start().await;
    let session = server.create_session("alice-token").await;
    let question = session["questions"][0]["id"].as_str().unwrap().to_owned();
    let path = format!("/api/questions/{question}/note");

    let (status, body) = server
        .post(&path, "alice-token", json!({ "note": "draft" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["note"], "draft");

    let (status, body) = server
        .send(reqwest::Method::POST, &path, Some("alice-token"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["question"]["note"], "");
}
