use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use upload_core::{create_app_with_config, AppConfig, AppState};

const BOUNDARY: &str = "profile-upload-boundary";

async fn setup_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let mut config = AppConfig::default();
    config.files.upload_dir = temp_dir.path().join("uploads");
    config.files.create_subdirectories = false;

    let state = AppState::from_config(&config).await.unwrap();
    (create_app_with_config(state, &config), temp_dir)
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("file", filename, content_type, data)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_upload_and_download_text_document() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(upload_request("/api/documents?user_id=5", "a.txt", "text/plain", b"hello world"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["document"]["processing_status"], "uploaded");
    assert_eq!(body["document"]["content_type"], "text/plain");
    assert!(body["document"].get("path").is_none());
    let document_id = body["document_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/documents/{}", document_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["original_filename"], "a.txt");
    assert_eq!(body["user_id"], 5);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/documents/{}/download", document_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a.txt\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello world");

    let response = app
        .oneshot(get_request("/api/documents?user_id=5"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["documents"][0]["id"], document_id.as_str());
}

#[tokio::test]
async fn test_list_defaults_to_first_page_of_fifty() {
    let (app, _temp_dir) = setup_test_app().await;

    for i in 0..60 {
        let response = app
            .clone()
            .oneshot(upload_request(
                "/api/documents?user_id=9",
                &format!("notes-{}.txt", i),
                "text/plain",
                b"hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get_request("/api/documents")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 50);
    assert_eq!(body["total"], 60);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);

    let response = app
        .oneshot(get_request("/api/documents?user_id=9&offset=50"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 10);
    assert_eq!(body["limit"], 50);
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(upload_request("/api/documents", "resume.exe", "application/pdf", b"MZ\x90\x00"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["reason"], "ExtensionNotAllowed");
    assert_eq!(
        body["error"],
        "File validation failed: File type not allowed. Allowed types: .pdf, .doc, .docx, .txt, .jpg, .png"
    );

    let response = app.oneshot(get_request("/api/documents")).await.unwrap();
    assert_eq!(body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_script_in_pdf_is_rejected() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app
        .oneshot(upload_request(
            "/api/documents",
            "resume.pdf",
            "application/pdf",
            b"%PDF-1.7\n1 0 obj <</JS (<ScRiPt>alert(1)</script>)>>",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "SuspiciousContent");
}

#[tokio::test]
async fn test_oversize_upload_reaches_validator() {
    let (app, _temp_dir) = setup_test_app().await;

    let data = vec![b'a'; 10 * 1024 * 1024 + 1];
    let response = app
        .oneshot(upload_request("/api/documents", "big.txt", "text/plain", &data))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "FileTooLarge");
}

#[tokio::test]
async fn test_missing_file_field() {
    let (app, _temp_dir) = setup_test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("attachment", "a.txt", "text/plain", b"hi")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file provided");
}

#[tokio::test]
async fn test_validate_endpoint_reports_without_storing() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(upload_request("/api/uploads/validate", "resume.pdf", "application/pdf", b"%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["mime_type"], "application/pdf");
    assert!(body["reason"].is_null());

    let long_name = format!("{}.txt", "n".repeat(260));
    let response = app
        .clone()
        .oneshot(upload_request("/api/uploads/validate", &long_name, "text/plain", b"ok"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["reason"], "FilenameTooLong");
    assert_eq!(body["message"], "Filename too long. Maximum length is 255 characters");

    let response = app.oneshot(get_request("/api/documents")).await.unwrap();
    assert_eq!(body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_status_update_and_delete() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(upload_request("/api/documents", "cv.docx", "application/octet-stream", b"PK\x03\x04"))
        .await
        .unwrap();
    let document_id = body_json(response).await["document_id"]
        .as_str()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/documents/{}/status", document_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": "completed" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["processing_status"], "completed");
    assert!(!body["data"]["processed_at"].is_null());

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/documents/{}", document_id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/api/documents/{}", document_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_policy_and_unknown_route() {
    let (app, _temp_dir) = setup_test_app().await;

    let response = app.clone().oneshot(get_request("/api/uploads/policy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["max_file_size_bytes"], 10 * 1024 * 1024);
    assert_eq!(body["data"]["max_filename_length"], 255);
    assert_eq!(body["data"]["allowed_types"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["allowed_types"][0]["extension"], ".pdf");

    let response = app.oneshot(get_request("/api/profiles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
