use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// Streams a stored file back under the name it was uploaded with. Stored
/// files live in a flat namespace: nested or traversing names never resolve
/// to anything.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
        return Err((StatusCode::NOT_FOUND, "File not found".to_string()));
    }

    let (file, len) = state
        .storage
        .open(&file_name)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "File not found".to_string()))?;

    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];

    Ok((headers, body).into_response())
}
