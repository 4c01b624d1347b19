// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router-level integration tests. Requests are driven straight into the
// axum router with `oneshot`, so no socket is bound; multipart bodies are
// assembled by hand. Endpoints needing a pdfium library or OCR models are
// exercised through their pure-Rust siblings instead.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use blattwerk_core::AppConfig;
use blattwerk_document::PdfWriter;
use blattwerk_server::{AppState, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "blattwerk-test-boundary";

/// Router backed by a throwaway temp store.
fn test_router() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig {
        temp_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let state = AppState::new(config).expect("state");
    (dir, build_router(state))
}

enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Assemble a multipart/form-data body.
fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request")
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

fn sample_pdf(lines: usize) -> Vec<u8> {
    let text: String = (0..lines).map(|i| format!("line number {i}\n")).collect();
    PdfWriter::a4().create_from_text(&text).expect("sample pdf")
}

fn page_count(pdf: &[u8]) -> usize {
    lopdf::Document::load_mem(pdf)
        .expect("load pdf")
        .get_pages()
        .len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let (_dir, router) = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
}

#[tokio::test]
async fn index_lists_operations() {
    let (_dir, router) = test_router();
    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(
        parsed["operations"]
            .as_array()
            .unwrap()
            .iter()
            .any(|op| op == "merge")
    );
}

#[tokio::test]
async fn merge_returns_combined_pdf() {
    let (_dir, router) = test_router();
    let first = sample_pdf(200);
    let second = sample_pdf(5);
    let expected = page_count(&first) + page_count(&second);

    let request = multipart_request(
        "/api/merge",
        &[
            Part::File {
                name: "files",
                filename: "a.pdf",
                content_type: "application/pdf",
                bytes: &first,
            },
            Part::File {
                name: "files",
                filename: "b.pdf",
                content_type: "application/pdf",
                bytes: &second,
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));

    let merged = body_bytes(response).await;
    assert!(merged.starts_with(b"%PDF-"));
    assert_eq!(page_count(&merged), expected);
}

#[tokio::test]
async fn merge_without_uploads_is_a_client_error() {
    let (_dir, router) = test_router();
    let request = multipart_request(
        "/api/merge",
        &[Part::Text {
            name: "note",
            value: "no files attached",
        }],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_bytes(response).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["error"].as_str().unwrap().contains("files"));
}

#[tokio::test]
async fn split_extracts_a_single_page() {
    let (_dir, router) = test_router();
    let multi = sample_pdf(200);
    assert!(page_count(&multi) > 1);

    let request = multipart_request(
        "/api/split",
        &[
            Part::File {
                name: "file",
                filename: "in.pdf",
                content_type: "application/pdf",
                bytes: &multi,
            },
            Part::Text {
                name: "page",
                value: "1",
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(page_count(&body), 1);
}

#[tokio::test]
async fn split_page_out_of_range_is_a_client_error() {
    let (_dir, router) = test_router();
    let single = sample_pdf(2);

    let request = multipart_request(
        "/api/split",
        &[
            Part::File {
                name: "file",
                filename: "in.pdf",
                content_type: "application/pdf",
                bytes: &single,
            },
            Part::Text {
                name: "page",
                value: "42",
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rotate_round_trips_through_the_api() {
    let (_dir, router) = test_router();
    let input = sample_pdf(3);

    let request = multipart_request(
        "/api/rotate",
        &[
            Part::File {
                name: "file",
                filename: "in.pdf",
                content_type: "application/pdf",
                bytes: &input,
            },
            Part::Text {
                name: "direction",
                value: "180",
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = body_bytes(response).await;
    let doc = lopdf::Document::load_mem(&rotated).unwrap();
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let rotate = doc
        .get_object(page_id)
        .ok()
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|dict| dict.get(b"Rotate").ok())
        .and_then(|r| r.as_i64().ok());
    assert_eq!(rotate, Some(180));
}

#[tokio::test]
async fn watermark_returns_a_pdf() {
    let (_dir, router) = test_router();
    let input = sample_pdf(3);

    let request = multipart_request(
        "/api/watermark",
        &[
            Part::File {
                name: "file",
                filename: "in.pdf",
                content_type: "application/pdf",
                bytes: &input,
            },
            Part::Text {
                name: "text",
                value: "INTERNAL",
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn compress_with_garbage_input_is_a_server_error() {
    let (_dir, router) = test_router();
    let request = multipart_request(
        "/api/compress",
        &[Part::File {
            name: "file",
            filename: "in.pdf",
            content_type: "application/pdf",
            bytes: b"this is not a pdf",
        }],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_bytes(response).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["error"].is_string());
}

#[tokio::test]
async fn ppt_gen_produces_a_deck_from_text_fields() {
    let (_dir, router) = test_router();
    let request = multipart_request(
        "/api/ppt_gen",
        &[
            Part::Text {
                name: "topic",
                value: "Release plan",
            },
            Part::Text {
                name: "details",
                value: "phase one\nphase two",
            },
        ],
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn protect_then_unlock_via_api() {
    let (_dir, router) = test_router();
    let input = sample_pdf(2);

    let protect = multipart_request(
        "/api/protect",
        &[
            Part::File {
                name: "file",
                filename: "in.pdf",
                content_type: "application/pdf",
                bytes: &input,
            },
            Part::Text {
                name: "password",
                value: "sesame",
            },
        ],
    );
    let response = router.clone().oneshot(protect).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let protected = body_bytes(response).await;
    assert!(lopdf::Document::load_mem(&protected).unwrap().is_encrypted());

    let unlock = multipart_request(
        "/api/unlock",
        &[
            Part::File {
                name: "file",
                filename: "locked.pdf",
                content_type: "application/pdf",
                bytes: &protected,
            },
            Part::Text {
                name: "password",
                value: "sesame",
            },
        ],
    );
    let response = router.oneshot(unlock).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let unlocked = body_bytes(response).await;
    assert!(!lopdf::Document::load_mem(&unlocked).unwrap().is_encrypted());
}

#[tokio::test]
async fn unknown_tool_gets_placeholder_response() {
    let (_dir, router) = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/translate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["message"].as_str().unwrap().contains("translate"));
}

#[tokio::test]
async fn artifacts_are_staged_in_the_temp_store() {
    let (dir, router) = test_router();
    let input = sample_pdf(2);

    let request = multipart_request(
        "/api/compress",
        &[Part::File {
            name: "file",
            filename: "in.pdf",
            content_type: "application/pdf",
            bytes: &input,
        }],
    );
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The delivered artifact stays on disk for the sweep to reclaim.
    let staged = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(staged, 1);
}
