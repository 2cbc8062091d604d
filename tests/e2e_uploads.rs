//! E2E tests for image uploads

mod common;

use common::TestServer;
use serde_json::Value;

// Smallest valid-enough payload for the store; content is never decoded.
const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn image_form(content_type: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(FAKE_PNG.to_vec())
        .file_name("test.png")
        .mime_str(content_type)
        .unwrap();
    reqwest::multipart::Form::new().part("image", part)
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/uploads/image"))
        .multipart(image_form("image/png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_upload_and_fetch_round_trip() {
    let server = TestServer::new().await;
    let token = server.register("alice", "alice@x.com", "Passw0rd!").await;

    let response = server
        .client
        .post(server.url("/api/uploads/image"))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(image_form("image/png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    let image_url = json["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("/uploads/images/"));
    assert!(image_url.ends_with(".png"));

    let fetched = server
        .client
        .get(server.url(image_url))
        .send()
        .await
        .unwrap();
    assert_eq!(fetched.status(), 200);
    assert_eq!(
        fetched.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(fetched.bytes().await.unwrap().as_ref(), FAKE_PNG);
}

#[tokio::test]
async fn test_upload_rejects_non_image_content_type() {
    let server = TestServer::new().await;
    let token = server.register("alice", "alice@x.com", "Passw0rd!").await;

    let response = server
        .client
        .post(server.url("/api/uploads/image"))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(image_form("application/pdf"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_upload_without_image_field_rejected() {
    let server = TestServer::new().await;
    let token = server.register("alice", "alice@x.com", "Passw0rd!").await;

    let form = reqwest::multipart::Form::new().text("other", "value");
    let response = server
        .client
        .post(server.url("/api/uploads/image"))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn test_fetch_missing_image_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/uploads/images/missing.png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}
