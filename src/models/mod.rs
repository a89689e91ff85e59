use tempfile::NamedTempFile;

/// Multipart field name the upload must arrive under.
pub const UPLOAD_FIELD: &str = "uploaded_file";

/// Status the transport layer attaches to the upload field of a request.
/// Only `Ok` lets the handler proceed; every other value collapses into the
/// single upload-error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Ok,
    /// Field missing, empty filename, or a body that is not multipart
    NoFile,
    /// Field grew past the configured size cap
    SizeExceeded,
    /// Body ended or errored mid-field
    Truncated,
    /// Writing the temporary spool failed
    SpoolFailed,
}

impl TransportStatus {
    pub fn is_ok(self) -> bool {
        self == TransportStatus::Ok
    }
}

/// An uploaded file spooled to temporary storage, waiting to be moved into
/// the destination directory or discarded with the request.
pub struct SpooledFile {
    /// Temporary spool; deleted on drop unless the move already consumed it
    pub tmp: NamedTempFile,
    /// Client-supplied filename, untrusted and kept verbatim
    pub original_name: String,
    pub size: u64,
    /// Client-supplied content type; recorded but never used for validation
    pub content_type_hint: Option<String>,
}

/// The `uploaded_file` field of one request as the transport layer saw it.
pub struct UploadField {
    pub status: TransportStatus,
    pub file: Option<SpooledFile>,
}

impl UploadField {
    pub fn failed(status: TransportStatus) -> Self {
        Self { status, file: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_status_ok() {
        assert!(TransportStatus::Ok.is_ok());
        assert!(!TransportStatus::NoFile.is_ok());
        assert!(!TransportStatus::SizeExceeded.is_ok());
    }

    #[test]
    fn test_failed_field_has_no_file() {
        let field = UploadField::failed(TransportStatus::Truncated);
        assert_eq!(field.status, TransportStatus::Truncated);
        assert!(field.file.is_none());
    }
}
