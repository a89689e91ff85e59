use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Narrow seam over the destination directory. Handlers never touch the
/// filesystem directly, so locking or content-addressed naming could be
/// introduced here without changing them. Concurrent moves to the same name
/// are not coordinated: last writer wins.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Raw concatenation of the directory and the client-supplied name. The
    /// name is not sanitized; callers inherit whatever path it denotes.
    fn destination(&self, file_name: &str) -> PathBuf;

    /// Create the destination directory and any missing parents, mode 0755.
    async fn ensure_dir(&self) -> Result<()>;

    /// Move `src` into the directory under `file_name`, silently replacing
    /// any existing file. Returns the final path.
    async fn move_file(&self, src: &Path, file_name: &str) -> Result<PathBuf>;

    /// Open a stored file for reading, returning it with its length.
    async fn open(&self, file_name: &str) -> io::Result<(fs::File, u64)>;
}

/// Local-filesystem storage rooted at the upload directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn destination(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    async fn ensure_dir(&self) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);
        builder
            .create(&self.root)
            .await
            .with_context(|| format!("creating upload directory {}", self.root.display()))
    }

    async fn move_file(&self, src: &Path, file_name: &str) -> Result<PathBuf> {
        let dest = self.destination(file_name);
        if fs::rename(src, &dest).await.is_err() {
            // The spool usually lives on another mount, where rename cannot
            // reach; copy and unlink instead.
            fs::copy(src, &dest)
                .await
                .with_context(|| format!("moving upload to {}", dest.display()))?;
            let _ = fs::remove_file(src).await;
        }
        Ok(dest)
    }

    async fn open(&self, file_name: &str) -> io::Result<(fs::File, u64)> {
        let path = self.destination(file_name);
        let file = fs::File::open(&path).await?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }
        Ok((file, meta.len()))
    }
}
