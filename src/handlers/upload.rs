use crate::AppState;
use crate::models::{SpooledFile, TransportStatus, UPLOAD_FIELD, UploadField};
use crate::utils::validation::{extension_allowed, file_extension};
use axum::{
    extract::{FromRequest, Multipart, Request, State, multipart::Field},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Outcome of one upload request. The body is the protocol: existing
/// clients match on these exact strings, and every one of them is delivered
/// with HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Stored,
    InvalidRequest,
    TransportFailed,
    MoveFailed,
    /// Unreachable while the extension filter stays disabled
    ExtensionRejected,
}

impl UploadStatus {
    pub fn message(self) -> &'static str {
        match self {
            UploadStatus::Stored => "ファイルは正常にアップロードされました。",
            UploadStatus::InvalidRequest => "無効なリクエストです。",
            UploadStatus::TransportFailed => "ファイルのアップロード中にエラーが発生しました。",
            UploadStatus::MoveFailed => "ファイルの移動中にエラーが発生しました。",
            UploadStatus::ExtensionRejected => {
                "アップロードされたファイルの拡張子が許可されていません。"
            }
        }
    }
}

impl IntoResponse for UploadStatus {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
            self.message(),
        )
            .into_response()
    }
}

/// Accepts a single `uploaded_file` multipart field and moves it into the
/// destination directory under its client-supplied name, verbatim. An
/// existing file of the same name is overwritten without comment.
pub async fn handle_upload(State(state): State<AppState>, request: Request) -> UploadStatus {
    if request.method() != Method::POST {
        return UploadStatus::InvalidRequest;
    }

    let field = read_upload_field(request, state.config.max_file_size).await;
    if !field.status.is_ok() {
        tracing::warn!(status = ?field.status, "upload rejected by transport");
        return UploadStatus::TransportFailed;
    }
    let Some(file) = field.file else {
        return UploadStatus::TransportFailed;
    };
    let SpooledFile {
        tmp,
        original_name,
        size,
        content_type_hint,
    } = file;

    let extension = file_extension(&original_name);
    // Inert by deployment choice: extension_allowed() accepts everything
    // while EXTENSION_FILTER_ENABLED stays false.
    if !extension_allowed(&extension) {
        return UploadStatus::ExtensionRejected;
    }

    if let Err(e) = state.storage.ensure_dir().await {
        tracing::error!("failed to prepare upload directory: {e:#}");
        return UploadStatus::MoveFailed;
    }

    // Close the spool handle before the rename; the path keeps the file
    // alive and cleans it up if the move never happens.
    let spool_path = tmp.into_temp_path();
    match state.storage.move_file(&spool_path, &original_name).await {
        Ok(dest) => {
            tracing::info!(
                name = %original_name,
                size,
                content_type = content_type_hint.as_deref().unwrap_or("unknown"),
                dest = %dest.display(),
                "stored upload"
            );
            UploadStatus::Stored
        }
        Err(e) => {
            tracing::error!(name = %original_name, "failed to move upload: {e:#}");
            UploadStatus::MoveFailed
        }
    }
}

/// Transport layer: pulls the `uploaded_file` field out of the request and
/// spools it to disk, reducing every failure mode to a `TransportStatus`.
async fn read_upload_field(request: Request, max_size: usize) -> UploadField {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        // Not a multipart body at all; same outcome as a form without the
        // field.
        Err(_) => return UploadField::failed(TransportStatus::NoFile),
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return UploadField::failed(TransportStatus::NoFile),
            Err(_) => return UploadField::failed(TransportStatus::Truncated),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            // Unrelated fields are drained and ignored.
            continue;
        }
        return spool_field(field, max_size).await;
    }
}

async fn spool_field(mut field: Field<'_>, max_size: usize) -> UploadField {
    let original_name = match field.file_name() {
        Some(name) if !name.is_empty() => name.to_string(),
        // A form submitted with no file selected sends an empty filename.
        _ => return UploadField::failed(TransportStatus::NoFile),
    };
    let content_type_hint = field.content_type().map(|s| s.to_string());

    let tmp = match NamedTempFile::new() {
        Ok(tmp) => tmp,
        Err(e) => {
            tracing::error!("failed to create spool file: {e}");
            return UploadField::failed(TransportStatus::SpoolFailed);
        }
    };
    let mut spool = match tmp.reopen() {
        Ok(handle) => tokio::fs::File::from_std(handle),
        Err(e) => {
            tracing::error!("failed to reopen spool file: {e}");
            return UploadField::failed(TransportStatus::SpoolFailed);
        }
    };

    let mut size: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(_) => return UploadField::failed(TransportStatus::Truncated),
        };
        size += chunk.len() as u64;
        if size > max_size as u64 {
            return UploadField::failed(TransportStatus::SizeExceeded);
        }
        if let Err(e) = spool.write_all(&chunk).await {
            tracing::error!("failed to write spool file: {e}");
            return UploadField::failed(TransportStatus::SpoolFailed);
        }
    }
    if let Err(e) = spool.flush().await {
        tracing::error!("failed to flush spool file: {e}");
        return UploadField::failed(TransportStatus::SpoolFailed);
    }

    UploadField {
        status: TransportStatus::Ok,
        file: Some(SpooledFile {
            tmp,
            original_name,
            size,
            content_type_hint,
        }),
    }
}
