use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tokio_util::io::ReaderStream;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::{core_error, files_error, join_error, multipart_error, ApiError};
use crate::AppState;
use api_shared::{FileRecord, HealthRes, HealthService, UploadRes};
use filedrop_core::constants::THUMBNAIL_URL_PREFIX;
use filedrop_core::{FileKey, FileStore};

/// Name of the multipart part carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// Allowance on top of the upload limit for multipart boundaries and part headers.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(health, upload, list_files, download, thumbnail),
    components(schemas(FileRecord, UploadRes, HealthRes))
)]
pub struct ApiDoc;

/// Build the REST router over `state`.
///
/// Routes:
/// - `GET /health`
/// - `POST /upload` (multipart, one `file` part)
/// - `GET /files`
/// - `GET /download/{name}`
/// - `GET /thumbnails/{name}` from the thumbnail directory, sanitised like downloads
/// - everything else from the public directory, when one is configured
pub fn router(state: AppState) -> Router {
    let cfg = state.config();
    let body_limit = usize::try_from(cfg.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);
    let thumbnail_route = format!("{THUMBNAIL_URL_PREFIX}/*name");
    let public_dir = cfg.public_dir().map(ServeDir::new);

    let mut app = Router::new()
        .route("/health", get(health))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(list_files))
        .route("/download/", get(download_without_name))
        .route("/download/*name", get(download))
        .route(&thumbnail_route, get(thumbnail))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(public_dir) = public_dir {
        app = app.fallback_service(public_dir);
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Form with a single `file` part"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadRes),
        (status = 400, description = "Missing file part or unusable file name"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 500, description = "Internal server error")
    )
)]
/// Store one uploaded file
///
/// The file name is reduced to its final path segment before anything is written. The body
/// of the `file` part is accumulated up to the configured limit; crossing the limit rejects
/// the upload before the store is touched. Image uploads get a thumbnail job handed to the
/// scheduler, and the response is sent without waiting for it.
///
/// # Errors
/// Returns:
/// - `400 Bad Request` if the form has no `file` part, or its name is unusable,
/// - `413 Payload Too Large` if the file exceeds the upload limit,
/// - `500 Internal Server Error` if the store cannot be written.
#[axum::debug_handler]
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadRes>, ApiError> {
    let limit = state.config().max_upload_bytes();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or((StatusCode::BAD_REQUEST, "Error retrieving file"))?;
        let key = FileKey::sanitize(&raw_name).map_err(|e| {
            tracing::debug!("Rejected upload name {:?}: {}", raw_name, e);
            (StatusCode::BAD_REQUEST, "Invalid file name")
        })?;

        let mut content = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if (content.len() + chunk.len()) as u64 > limit {
                tracing::info!(name = %key, limit, "Rejected oversized upload");
                return Err((StatusCode::PAYLOAD_TOO_LARGE, "File too big"));
            }
            content.extend_from_slice(&chunk);
        }

        let uploads = state.uploads.clone();
        let uploaded = tokio::task::spawn_blocking(move || uploads.put(key.as_str(), &content[..]))
            .await
            .map_err(join_error)?
            .map_err(core_error)?;

        return Ok(Json(UploadRes {
            name: uploaded.stored.name.to_string(),
            size: uploaded.stored.size_bytes,
            thumbnail_scheduled: uploaded.thumbnail_scheduled,
        }));
    }

    Err((StatusCode::BAD_REQUEST, "Error retrieving file"))
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Stored files in directory order", body = [FileRecord]),
        (status = 500, description = "Internal server error")
    )
)]
/// List every stored file
///
/// Records are assembled on every call; a thumbnail reference is present only if the
/// thumbnail exists at the moment of listing.
///
/// # Errors
/// Returns `500 Internal Server Error` if the store directory cannot be read.
#[axum::debug_handler]
async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let listing = state.listing.clone();
    let records = tokio::task::spawn_blocking(move || listing.list())
        .await
        .map_err(join_error)?
        .map_err(core_error)?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/download/{name}",
    params(
        ("name" = String, Path, description = "Stored file name; directory components are ignored")
    ),
    responses(
        (status = 200, description = "Raw file content"),
        (status = 400, description = "Name is empty or unusable"),
        (status = 404, description = "No stored file by that name"),
        (status = 500, description = "Internal server error")
    )
)]
/// Download a stored file by name
///
/// The name is sanitised exactly as uploads are: `/download/a/b/evil.txt` serves the stored
/// key `evil.txt`. The body is streamed from disk.
///
/// # Errors
/// Returns:
/// - `400 Bad Request` if the name sanitises to nothing usable,
/// - `404 Not Found` if no stored file has that name,
/// - `500 Internal Server Error` if the file cannot be opened.
#[axum::debug_handler]
async fn download(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<Response, ApiError> {
    serve_stored(state.uploads.store().clone(), name).await
}

#[utoipa::path(
    get,
    path = "/thumbnails/{name}",
    params(
        ("name" = String, Path, description = "Stored file name; directory components are ignored")
    ),
    responses(
        (status = 200, description = "Thumbnail image"),
        (status = 400, description = "Name is unusable"),
        (status = 404, description = "No thumbnail exists (yet) for that name"),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch the thumbnail of a stored image
///
/// Only finished thumbnails are reachable; the name is reduced to its final segment, so
/// in-progress output under the staging directory is never served.
#[axum::debug_handler]
async fn thumbnail(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<Response, ApiError> {
    serve_stored(state.thumbnails.clone(), name).await
}

async fn serve_stored(store: FileStore, name: String) -> Result<Response, ApiError> {
    let opened = tokio::task::spawn_blocking(move || store.open(&name))
        .await
        .map_err(join_error)?
        .map_err(files_error)?;

    let content_type = opened.media_type.unwrap_or("application/octet-stream");
    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(opened.file)));

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_LENGTH,
                opened.metadata.size_bytes.to_string(),
            ),
        ],
        body,
    )
        .into_response())
}

async fn download_without_name() -> ApiError {
    (StatusCode::BAD_REQUEST, "Filename required")
}
