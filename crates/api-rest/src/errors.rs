use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use filedrop_core::{CoreError, FilesError};

pub(crate) type ApiError = (StatusCode, &'static str);

/// Map a core failure onto the response the client sees.
///
/// Client mistakes keep their 4xx status; everything else is logged and reported as a bare
/// internal error.
pub(crate) fn core_error(e: CoreError) -> ApiError {
    match e {
        CoreError::Files(e) => files_error(e),
        other => {
            tracing::error!("Core error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

pub(crate) fn files_error(e: FilesError) -> ApiError {
    match e {
        FilesError::InvalidName(e) => {
            tracing::debug!("Rejected file name: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid file name")
        }
        FilesError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found"),
        FilesError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too big"),
        other => {
            tracing::error!("Storage error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

pub(crate) fn multipart_error(e: MultipartError) -> ApiError {
    let status = e.status();
    tracing::debug!("Multipart error ({}): {}", status, e);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        (status, "File too big")
    } else if status.is_client_error() {
        (status, "Error retrieving file")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> ApiError {
    tracing::error!("Blocking task failed: {:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}
