//! Integration tests for HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::fixtures::{BOUNDARY, completed_record, multipart_upload_body};
use common::server::TestServer;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Helper to make JSON requests.
async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Helper to upload a file through the multipart endpoint.
async fn upload(
    server: &TestServer,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (StatusCode, Value) {
    let body = multipart_upload_body(filename, content_type, data, Some("test upload"));
    let request = Request::builder()
        .method("POST")
        .uri("/v1/images")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_check_reports_ok() {
    let server = TestServer::new().await;
    let (status, body) = json_request(&server.router, "GET", "/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn upload_get_stream_delete_flow() {
    let server = TestServer::new().await;

    let (status, body) = upload(&server, "cat.png", "image/png", b"png-bytes-here").await;
    assert_eq!(status, StatusCode::CREATED);
    let image_id = body["imageId"].as_str().unwrap().to_string();
    assert!(image_id.starts_with("img_"));
    assert!(body["imageUrl"].as_str().unwrap().contains(&image_id));

    // Metadata is immediately readable with defaults applied.
    let (status, body) =
        json_request(&server.router, "GET", &format!("/v1/images/{image_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "cat.png");
    assert_eq!(body["mimeType"], "image/png");
    assert_eq!(body["size"], 14);
    assert_eq!(body["status"], "uploading");
    assert_eq!(body["labels"], json!([]));

    // The binary streams back with its headers.
    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/images/{image_id}/file"))
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(
        response.headers()["cache-control"],
        "public, max-age=86400"
    );
    let file_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&file_bytes[..], b"png-bytes-here");

    // Delete removes both the object and the metadata.
    let (status, body) = json_request(
        &server.router,
        "DELETE",
        &format!("/v1/images/{image_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains(&image_id));

    let (status, _) =
        json_request(&server.router, "GET", &format!("/v1/images/{image_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_rejects_unsupported_content_type() {
    let server = TestServer::new().await;
    let (status, body) = upload(&server, "doc.pdf", "application/pdf", b"%PDF-").await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "invalid_upload");
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let server = TestServer::new().await;

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"description\"\r\n\r\n");
    body.extend_from_slice(b"no file here\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/images")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_paginates_without_overlap() {
    let server = TestServer::new().await;
    for i in 0..15 {
        server
            .metadata()
            .put(&completed_record(&format!("img_{i:02}"), &[]))
            .await
            .unwrap();
    }

    let (status, first) =
        json_request(&server.router, "GET", "/v1/images?page=1&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["images"].as_array().unwrap().len(), 10);
    assert_eq!(first["pagination"]["page"], 1);
    assert_eq!(first["pagination"]["limit"], 10);
    assert_eq!(first["pagination"]["hasMore"], true);

    let (_, second) =
        json_request(&server.router, "GET", "/v1/images?page=2&limit=10", None).await;
    assert_eq!(second["images"].as_array().unwrap().len(), 5);
    assert_eq!(second["pagination"]["hasMore"], false);

    let first_ids: Vec<&str> = first["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    for image in second["images"].as_array().unwrap() {
        assert!(!first_ids.contains(&image["id"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn listing_empty_store_is_an_empty_page() {
    let server = TestServer::new().await;
    let (status, body) = json_request(&server.router, "GET", "/v1/images", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"], json!([]));
    assert_eq!(body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn search_returns_annotated_matches() {
    let server = TestServer::new().await;
    server
        .metadata()
        .put(&completed_record("img_car", &[("Car", 95.0)]))
        .await
        .unwrap();
    server
        .metadata()
        .put(&completed_record("img_tree", &[("Tree", 99.0)]))
        .await
        .unwrap();

    let (status, body) = json_request(
        &server.router,
        "GET",
        "/v1/images/search?label=car&confidence=80",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["id"], "img_car");
    assert_eq!(images[0]["matchingLabel"]["name"], "Car");
    assert_eq!(images[0]["matchingLabel"]["confidence"], 95.0);
    assert_eq!(body["searchCriteria"]["label"], "car");
    assert_eq!(body["searchCriteria"]["confidence"], 80.0);
}

#[tokio::test]
async fn search_respects_confidence_threshold() {
    let server = TestServer::new().await;
    server
        .metadata()
        .put(&completed_record("img_car", &[("Car", 95.5)]))
        .await
        .unwrap();

    let (status, body) = json_request(
        &server.router,
        "GET",
        "/v1/images/search?label=Car&confidence=99.9",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"], json!([]));
}

#[tokio::test]
async fn search_requires_a_label() {
    let server = TestServer::new().await;
    let (status, _) = json_request(&server.router, "GET", "/v1/images/search", None).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn labels_endpoint_aggregates_and_filters() {
    let server = TestServer::new().await;
    server
        .metadata()
        .put(&completed_record("img_1", &[("Car", 95.0), ("Tree", 85.0)]))
        .await
        .unwrap();
    server
        .metadata()
        .put(&completed_record("img_2", &[("Car", 90.0)]))
        .await
        .unwrap();

    let (status, body) = json_request(&server.router, "GET", "/v1/images/labels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let labels = body["labels"].as_array().unwrap();
    assert_eq!(labels[0]["name"], "Car");
    assert_eq!(labels[0]["count"], 2);
    assert_eq!(labels[0]["averageConfidence"], 92.5);
    assert_eq!(labels[1]["name"], "Tree");

    let (_, filtered) = json_request(
        &server.router,
        "GET",
        "/v1/images/labels?minCount=2",
        None,
    )
    .await;
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["labels"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_callback_updates_record_and_labels() {
    let server = TestServer::new().await;
    server
        .metadata()
        .put(&completed_record("img_1", &[("Old", 50.0)]))
        .await
        .unwrap();

    let (status, _) = json_request(
        &server.router,
        "PUT",
        "/v1/images/img_1/status",
        Some(json!({
            "status": "completed",
            "labels": [{"name": "Car", "confidence": 97.5}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = json_request(&server.router, "GET", "/v1/images/img_1", None).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["labels"], json!([{"name": "Car", "confidence": 97.5}]));
}

#[tokio::test]
async fn status_callback_rejects_unknown_status() {
    let server = TestServer::new().await;
    let (status, _) = json_request(
        &server.router,
        "PUT",
        "/v1/images/img_1/status",
        Some(json!({"status": "mystery"})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn missing_image_routes_return_not_found() {
    let server = TestServer::new().await;

    let (status, _) = json_request(&server.router, "GET", "/v1/images/img_nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        json_request(&server.router, "GET", "/v1/images/img_nope/file", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(&server.router, "DELETE", "/v1/images/img_nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
