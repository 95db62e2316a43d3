//! HTTP API tests against a live server on a free port.

mod common;

use common::faq_bot;
use serde_json::{json, Value};
use std::sync::Arc;
use support_bot::agent::FALLBACK_ANSWER;
use support_bot::server::serve;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start a server over the FAQ bot and return its base URL.
async fn start() -> String {
    let (bot, _) = faq_bot().await;
    let port = find_free_port();
    let addr = format!("127.0.0.1:{}", port);
    tokio::spawn(async move {
        serve(Arc::new(bot), &addr).await.unwrap();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_health_and_sections() {
    let base = start().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["corpus"], "loaded");
    assert_eq!(health["sections"], 3);

    let sections: Value = client
        .get(format!("{}/sections", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sections["source"], "faq.txt");
    assert_eq!(sections["sections"][1]["index"], 1);
    assert_eq!(
        sections["sections"][1]["text"],
        "Shipping takes 3-7 days depending on your location."
    );
}

#[tokio::test]
async fn test_ask() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "query": "How long for a refund?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["answer"],
        "Refunds are processed within 5 business days."
    );
    assert_eq!(body["retrieval"]["index"], 0);

    let body: Value = client
        .post(format!("{}/ask", base))
        .json(&json!({ "query": "What color is the sky?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["answer"], FALLBACK_ANSWER);
    assert!(body["retrieval"].is_null());
}

#[tokio::test]
async fn test_ask_rejects_empty_query() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_feedback() {
    let base = start().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/feedback", base))
        .json(&json!({
            "query": "refund?",
            "answer": "5 business days",
            "feedback": "too vague",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["answer"],
        "5 business days (For more context: Refunds are processed within 5 business days.)"
    );

    let body: Value = client
        .post(format!("{}/feedback", base))
        .json(&json!({
            "query": "refund?",
            "answer": "5 business days",
            "feedback": "great",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["answer"], "5 business days");
}
