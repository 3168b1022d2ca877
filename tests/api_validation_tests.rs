// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Validation runs before any database access, so these pass against the
//! offline mock database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "----bookclub-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
}

fn multipart_body(parts: Vec<Part>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_form(method: &str, uri: &str, parts: Vec<Part<'_>>) -> Response {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("reader-1", &state.config.jwt_signing_key);

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_check_in_without_title() {
    let response = post_form(
        "POST",
        "/api/groups/g1/check-ins",
        vec![Part::Text("title", "   "), Part::Text("pages_read", "12")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "title");
    assert_eq!(body["details"], "A check-in title is required.");
}

#[tokio::test]
async fn test_check_in_with_wrong_photo_type() {
    let response = post_form(
        "POST",
        "/api/groups/g1/check-ins",
        vec![
            Part::Text("title", "Finished part one"),
            Part::File {
                name: "photo",
                file_name: "page.pdf",
                content_type: "application/pdf",
                bytes: b"%PDF-1.7".to_vec(),
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["field"], "photo");
    assert_eq!(body["details"], "Photo must be a JPEG, PNG, WEBP, or GIF.");
}

#[tokio::test]
async fn test_check_in_with_oversized_photo() {
    let response = post_form(
        "POST",
        "/api/groups/g1/check-ins",
        vec![
            Part::Text("title", "Big picture"),
            Part::File {
                name: "photo",
                file_name: "shelf.jpg",
                content_type: "image/jpeg",
                bytes: vec![0xFF; 5 * 1024 * 1024 + 1],
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["field"], "photo");
}

#[tokio::test]
async fn test_valid_check_in_reaches_database() {
    let response = post_form(
        "POST",
        "/api/groups/g1/check-ins",
        vec![
            Part::Text("title", "Chapter 4"),
            Part::Text("pages_read", "-3"),
            Part::Text("chapters_read", "lots"),
            Part::File {
                name: "photo",
                file_name: "",
                content_type: "application/octet-stream",
                bytes: vec![],
            },
        ],
    )
    .await;

    // Counts are clamped and the empty photo part ignored, so validation
    // passes and the offline database answers
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_create_group_without_title() {
    let response = post_form(
        "POST",
        "/api/groups",
        vec![Part::Text("description", "Monthly classics")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["field"], "title");
    assert_eq!(body["details"], "A group title is required.");
}

#[tokio::test]
async fn test_edit_group_with_wrong_photo_type() {
    let response = post_form(
        "PUT",
        "/api/groups/g1",
        vec![
            Part::Text("title", "Renamed"),
            Part::File {
                name: "photo",
                file_name: "cover.svg",
                content_type: "image/svg+xml",
                bytes: b"<svg/>".to_vec(),
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_check_in_requires_multipart() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("reader-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/groups/g1/check-ins")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
