use std::env;
use std::path::PathBuf;

/// Directory every upload is moved into unless overridden.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploaded_files_e5796bd71a1642e97258a1835419f431";

/// Route prefix stored files are served back from.
pub const DEFAULT_DOWNLOAD_BASE_PATH: &str = "/uploaded_files_e5796bd71a1642e97258a1835419f431";

/// Server configuration for the upload/download routes
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Destination directory for uploads, created on demand
    pub upload_dir: PathBuf,

    /// Route the upload handler is mounted on (default: "/upload")
    pub upload_path: String,

    /// Route prefix for downloads (default: the upload directory name)
    pub download_base_path: String,

    /// Maximum accepted file size in bytes (default: 256 MB)
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            upload_path: "/upload".to_string(),
            download_base_path: DEFAULT_DOWNLOAD_BASE_PATH.to_string(),
            max_file_size: 256 * 1024 * 1024, // 256 MB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            upload_path: env::var("UPLOAD_PATH").unwrap_or(default.upload_path),

            download_base_path: env::var("DOWNLOAD_BASE_PATH")
                .unwrap_or(default.download_base_path),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),
        }
    }

    /// Same defaults with the destination directory replaced, for tests and
    /// embedded use
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert_eq!(config.upload_path, "/upload");
        assert_eq!(config.download_base_path, DEFAULT_DOWNLOAD_BASE_PATH);
        assert_eq!(config.max_file_size, 256 * 1024 * 1024);
    }

    #[test]
    fn test_from_env_overrides() {
        unsafe {
            env::set_var("UPLOAD_DIR", "/tmp/simpleud-config-test");
            env::set_var("MAX_FILE_SIZE", "1024");
        }
        let config = ServerConfig::from_env();
        unsafe {
            env::remove_var("UPLOAD_DIR");
            env::remove_var("MAX_FILE_SIZE");
        }
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/simpleud-config-test"));
        assert_eq!(config.max_file_size, 1024);
    }

    #[test]
    fn test_with_upload_dir() {
        let config = ServerConfig::with_upload_dir("/srv/files");
        assert_eq!(config.upload_dir, PathBuf::from("/srv/files"));
        assert_eq!(config.upload_path, "/upload");
    }
}
