//! Route handlers
//!
//! Each handler resolves the raw path from the request, runs the matching
//! storage operation on the blocking pool and renders or redirects.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use axum::{
    Form, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{Method, StatusCode, Uri, header},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use log::debug;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::error::{StorageError, WebError};
use crate::middleware::log_requests;
use crate::navigate::ResolvedLocation;
use crate::server::render::{listing_href, render_listing};
use crate::server::upload::stream_field_to_storage;
use crate::storage::{ListOutcome, StorageOperations};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: Arc<StorageOperations>,
}

impl AppState {
    pub fn new(storage: Arc<StorageOperations>) -> Self {
        Self { storage }
    }
}

/// `?path=` argument of the action routes
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderForm {
    #[serde(default)]
    pub foldername: String,
}

/// Builds the application router.
///
/// Any path not claimed by an action route is treated as a browse request.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/create_folder", post(create_folder))
        .route("/delete_file", post(delete_file))
        .route("/delete_folder", post(delete_folder))
        .route("/files", get(download))
        .fallback(browse)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Runs a storage call on the blocking thread pool.
async fn run_blocking<T, F>(storage: &Arc<StorageOperations>, op: F) -> Result<T, StorageError>
where
    F: FnOnce(&StorageOperations) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || op(&storage))
        .await
        .map_err(|e| StorageError::Io(io::Error::other(e)))?
}

fn redirect_to_listing(relative_path: &str) -> Response {
    Redirect::to(&listing_href(relative_path)).into_response()
}

/// Streams a file inline with a content type guessed from its name.
async fn serve_file(location: &ResolvedLocation) -> Result<Response, StorageError> {
    let file = tokio::fs::File::open(location.real_path())
        .await
        .map_err(|e| StorageError::from_io(e, location.relative_path()))?;
    let size = file.metadata().await?.len();
    let mime = mime_guess::from_path(location.real_path()).first_or_octet_stream();

    debug!("Streaming /{} ({} bytes)", location.relative_path(), size);
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// GET /<path> - list a directory, or serve the file at that path
async fn browse(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, WebError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let raw_path = urlencoding::decode(uri.path())
        .map(Cow::into_owned)
        .unwrap_or_else(|_| uri.path().to_string());
    let location = state.storage.resolve(&raw_path)?;

    let target = location.clone();
    let outcome = run_blocking(&state.storage, move |storage| storage.list(&target)).await?;

    match outcome {
        ListOutcome::Listing(listing) => Ok(Html(render_listing(&listing)).into_response()),
        ListOutcome::ServeFile(file) => Ok(serve_file(&file).await?),
    }
}

/// GET /files?path=<file> - download a file
async fn download(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, WebError> {
    let location = state.storage.resolve(&query.path)?;

    let file = run_blocking(&state.storage, move |storage| {
        storage.resolve_for_download(&location)
    })
    .await?;

    Ok(serve_file(&file).await?)
}

/// POST /upload?path=<dir> - store the multipart `file` field in a directory
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let location = state.storage.resolve(&query.path)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            debug!("Upload to /{} without a filename ignored", location.relative_path());
            continue;
        }

        stream_field_to_storage(&state.storage, location.clone(), filename, field).await?;
    }

    Ok(redirect_to_listing(location.relative_path()))
}

/// POST /create_folder?path=<dir> - create `foldername` inside a directory
async fn create_folder(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    Form(form): Form<FolderForm>,
) -> Result<Response, WebError> {
    let location = state.storage.resolve(&query.path)?;

    let directory = location.clone();
    run_blocking(&state.storage, move |storage| {
        storage.create_folder(&directory, &form.foldername)
    })
    .await?;

    Ok(redirect_to_listing(location.relative_path()))
}

/// POST /delete_file?path=<file> - delete a file, then show its directory
async fn delete_file(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, WebError> {
    let location = state.storage.resolve(&query.path)?;
    let parent = location.parent_relative_path().unwrap_or_default().to_string();

    run_blocking(&state.storage, move |storage| storage.delete_file(&location)).await?;

    Ok(redirect_to_listing(&parent))
}

/// POST /delete_folder?path=<dir> - delete a folder recursively, then show its parent
async fn delete_folder(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, WebError> {
    let location = state.storage.resolve(&query.path)?;
    let parent = location.parent_relative_path().unwrap_or_default().to_string();

    run_blocking(&state.storage, move |storage| storage.delete_folder(&location)).await?;

    Ok(redirect_to_listing(&parent))
}
