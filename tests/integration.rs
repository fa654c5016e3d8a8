use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use rax_drive::navigate::PathResolver;
use rax_drive::server::{AppState, build_router};
use rax_drive::storage::StorageOperations;

const BOUNDARY: &str = "rax-drive-test-boundary";
const MAX_BODY: usize = 1024 * 1024;

// Helper to build a router over a fresh storage root
fn setup_app() -> (TempDir, PathBuf, Router) {
    let temp = TempDir::new().unwrap();
    let resolver = PathResolver::new(temp.path().join("storage")).unwrap();
    let root = resolver.root().to_path_buf();
    let state = AppState::new(Arc::new(StorageOperations::new(resolver)));
    (temp, root, build_router(state, MAX_BODY))
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

async fn post_form(app: &Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn upload(app: &Router, uri: &str, filename: &str, content: &str) -> Response<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    let request = Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_empty_root_lists() {
    let (_temp, _root, app) = setup_app();

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Current path: /</h3>"));
    assert!(!html.contains("Go up"));
}

#[tokio::test]
async fn test_create_folder_and_browse() {
    let (_temp, root, app) = setup_app();

    let response = post_form(&app, "/create_folder?path=", "foldername=docs").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(root.join("docs").is_dir());

    // Second create is a silent no-op
    let response = post_form(&app, "/create_folder?path=", "foldername=docs").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(get(&app, "/").await).await;
    assert!(html.contains("href=\"/docs\""));

    let response = get(&app, "/docs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Current path: /docs</h3>"));
    assert!(html.contains("<a href=\"/\">Go up</a>"));
}

#[tokio::test]
async fn test_create_folder_empty_name_is_noop() {
    let (_temp, root, app) = setup_app();

    let response = post_form(&app, "/create_folder?path=", "foldername=").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_and_download() {
    let (_temp, root, app) = setup_app();
    fs::create_dir(root.join("docs")).unwrap();

    let response = upload(&app, "/upload?path=docs", "a.txt", "hi").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/docs");
    assert_eq!(fs::read_to_string(root.join("docs/a.txt")).unwrap(), "hi");

    let response = get(&app, "/files?path=docs%2Fa.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    assert_eq!(body_text(response).await, "hi");

    // Browsing a file path serves the file as well
    let response = get(&app, "/docs/a.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hi");
}

#[tokio::test]
async fn test_upload_overwrites() {
    let (_temp, root, app) = setup_app();

    upload(&app, "/upload?path=", "a.txt", "first").await;
    upload(&app, "/upload?path=", "a.txt", "second").await;

    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "second");
}

#[tokio::test]
async fn test_upload_without_filename_is_noop() {
    let (_temp, root, app) = setup_app();

    let response = upload(&app, "/upload?path=", "", "data").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_filename_traversal_stays_inside() {
    let (temp, root, app) = setup_app();

    let response = upload(&app, "/upload?path=", "../../evil.txt", "x").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(root.join("evil.txt").is_file());
    assert!(!temp.path().join("evil.txt").exists());
}

#[tokio::test]
async fn test_missing_paths_are_not_found() {
    let (_temp, _root, app) = setup_app();

    assert_eq!(get(&app, "/nope").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get(&app, "/files?path=nope.txt").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_traversal_resolves_inside_root() {
    let (_temp, root, app) = setup_app();

    let response = get(&app, "/files?path=secrets%2F..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    fs::create_dir(root.join("etc")).unwrap();
    fs::write(root.join("etc/passwd"), "sandboxed").unwrap();

    let response = get(&app, "/files?path=secrets%2F..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "sandboxed");
}

#[tokio::test]
async fn test_delete_file_redirects_to_parent() {
    let (_temp, root, app) = setup_app();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/a.txt"), "hi").unwrap();

    let response = post_empty(&app, "/delete_file?path=docs%2Fa.txt").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/docs");
    assert!(!root.join("docs/a.txt").exists());

    // Already gone: still a redirect, nothing changes
    let response = post_empty(&app, "/delete_file?path=docs%2Fa.txt").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(root.join("docs").is_dir());
}

#[tokio::test]
async fn test_delete_folder_recursive() {
    let (_temp, root, app) = setup_app();
    fs::create_dir_all(root.join("docs/2024")).unwrap();
    fs::write(root.join("docs/2024/r.txt"), "r").unwrap();

    let response = post_empty(&app, "/delete_folder?path=docs").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(!root.join("docs").exists());

    let html = body_text(get(&app, "/").await).await;
    assert!(!html.contains("href=\"/docs\""));
}

#[tokio::test]
async fn test_unsupported_method_on_browse() {
    let (_temp, _root, app) = setup_app();

    let response = post_empty(&app, "/docs").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_upload_over_body_limit_rejected() {
    let temp = TempDir::new().unwrap();
    let resolver = PathResolver::new(temp.path().join("storage")).unwrap();
    let root = resolver.root().to_path_buf();
    let app = build_router(AppState::new(Arc::new(StorageOperations::new(resolver))), 64);

    let response = upload(&app, "/upload?path=", "big.bin", &"x".repeat(1024)).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!root.join("big.bin").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_forbidden() {
    use std::os::unix::fs::symlink;

    let (temp, root, app) = setup_app();
    let outside = temp.path().join("outside");
    fs::create_dir(&outside).unwrap();
    fs::write(outside.join("secret.txt"), "secret").unwrap();
    symlink(&outside, root.join("escape")).unwrap();

    assert_eq!(get(&app, "/escape").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        get(&app, "/files?path=escape%2Fsecret.txt").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        post_empty(&app, "/delete_folder?path=escape").await.status(),
        StatusCode::FORBIDDEN
    );
    assert!(outside.join("secret.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_writes_into_symlinked_directory_forbidden() {
    use std::os::unix::fs::symlink;

    let (temp, root, app) = setup_app();
    let outside = temp.path().join("outside");
    fs::create_dir(&outside).unwrap();
    symlink(&outside, root.join("escape")).unwrap();

    let response = upload(&app, "/upload?path=escape", "evil.txt", "pwned").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = upload(&app, "/upload?path=", "escape/evil.txt", "pwned").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_form(&app, "/create_folder?path=escape", "foldername=newdir").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_form(&app, "/create_folder?path=", "foldername=escape%2Fnewdir").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(fs::read_dir(&outside).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_keeps_file_with_temp_style_name() {
    let (_temp, root, app) = setup_app();
    fs::write(root.join("report.tmp"), "precious").unwrap();

    let response = upload(&app, "/upload?path=", "report", "new").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(fs::read_to_string(root.join("report.tmp")).unwrap(), "precious");
    assert_eq!(fs::read_to_string(root.join("report")).unwrap(), "new");
    assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
}

#[tokio::test]
async fn test_large_upload_and_download_stream() {
    let (_temp, root, app) = setup_app();
    let content = "0123456789abcdef".repeat(32 * 1024);

    let response = upload(&app, "/upload?path=", "big.txt", &content).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(fs::read_to_string(root.join("big.txt")).unwrap(), content);

    let response = get(&app, "/files?path=big.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).unwrap(),
        content.len().to_string().as_str()
    );
    assert_eq!(body_text(response).await, content);
    assert_eq!(fs::read_dir(&root).unwrap().count(), 1);
}

#[tokio::test]
async fn test_strict_traversal_forbids_climbing() {
    let temp = TempDir::new().unwrap();
    let resolver = PathResolver::new(temp.path().join("storage"))
        .unwrap()
        .with_strict_traversal(true);
    let app = build_router(AppState::new(Arc::new(StorageOperations::new(resolver))), MAX_BODY);

    let response = get(&app, "/files?path=..%2Fsecret.txt").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
