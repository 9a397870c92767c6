use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use quizsmith_backend::config::Prompts;
use quizsmith_backend::generator::QuizGenerator;
use quizsmith_backend::model::CannedModel;
use quizsmith_backend::store::MemoryAttemptStore;
use quizsmith_backend::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over an in-memory store; `reply` is what the model answers (None = no model).
pub fn create_test_app(reply: Option<String>) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let generator = reply.map(|r| QuizGenerator::new(Arc::new(CannedModel::replying(r)), Prompts::default(), 0.7));
    let state = Arc::new(AppState::new(generator, Arc::new(MemoryAttemptStore::new())));
    build_router(state)
}

pub fn question_record(answer: &str) -> Value {
    json!({
        "prompt": "Which planet is largest?",
        "choices": [
            {"id": "a", "text": "Jupiter"},
            {"id": "b", "text": "Saturn"},
            {"id": "c", "text": "Earth"},
            {"id": "d", "text": "Mars"}
        ],
        "answer": answer,
        "explanation": "Jupiter has the greatest mass and radius.",
        "tags": ["astronomy"]
    })
}

pub fn spec_json(n: u32) -> Value {
    json!({"topic": "The solar system", "numQuestions": n, "difficulty": "easy"})
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}
