use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use simpleud::config::{DEFAULT_DOWNLOAD_BASE_PATH, ServerConfig};
use simpleud::services::storage::LocalStorage;
use simpleud::{AppState, create_app};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(upload_dir: &Path) -> Router {
    let config = ServerConfig::with_upload_dir(upload_dir);
    let storage = Arc::new(LocalStorage::new(config.upload_dir.clone()));
    create_app(AppState { storage, config })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_stored_file_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("data.bin"), b"\x00\x01binary\xff").unwrap();
    let app = test_app(tmp.path());

    let uri = format!("{DEFAULT_DOWNLOAD_BASE_PATH}/data.bin");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"data.bin\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), b"\x00\x01binary\xff");
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let uri = format!("{DEFAULT_DOWNLOAD_BASE_PATH}/absent.txt");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversing_names_never_resolve() {
    let tmp = tempfile::tempdir().unwrap();
    // A real file one level above the storage root.
    std::fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();
    let upload_dir = tmp.path().join("store");
    std::fs::create_dir_all(&upload_dir).unwrap();
    let app = test_app(&upload_dir);

    let uri = format!("{DEFAULT_DOWNLOAD_BASE_PATH}/..%2Fsecret.txt");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_then_download() {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("store");
    let app = test_app(&upload_dir);

    let boundary = "----------------------boundary42";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"uploaded_file\"; filename=\"note.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         remember this\r\n\
         --{boundary}--\r\n"
    );
    let upload = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("{DEFAULT_DOWNLOAD_BASE_PATH}/note.txt");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), b"remember this");
}
