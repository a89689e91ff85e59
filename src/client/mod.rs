use crate::models::UPLOAD_FIELD;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Characters escaped when a filename becomes a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/')
    .add(b'\\');

pub const SERVER_ADDRESS_VAR: &str = "UPLOAD_DOWNLOAD_SERVER_ADDRESS";
pub const UPLOAD_PATH_VAR: &str = "UPLOAD_PATH";
pub const DOWNLOAD_BASE_PATH_VAR: &str = "DOWNLOAD_BASE_PATH";

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0} is not set; pass it explicitly or export the environment variable")]
    MissingConfig(&'static str),

    #[error("server answered 404 Not Found for {url}")]
    NotFound { url: String },

    #[error("giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Uploads and downloads files against a server exposing the single-field
/// upload route and the static download prefix. Transfers are retried a
/// bounded number of times; a 404 fails immediately.
#[derive(Debug)]
pub struct TransferClient {
    http: reqwest::Client,
    upload_url: String,
    download_base_url: String,
}

impl TransferClient {
    /// Build a client from explicit values, falling back to the
    /// `UPLOAD_DOWNLOAD_SERVER_ADDRESS`, `UPLOAD_PATH` and
    /// `DOWNLOAD_BASE_PATH` environment variables for anything not given.
    pub fn new(
        server_address: Option<&str>,
        upload_path: Option<&str>,
        download_base_path: Option<&str>,
    ) -> Result<Self, ClientError> {
        let server_address = resolve(server_address, SERVER_ADDRESS_VAR)?;
        let upload_path = resolve(upload_path, UPLOAD_PATH_VAR)?;
        let download_base_path = resolve(download_base_path, DOWNLOAD_BASE_PATH_VAR)?;

        let server_address = server_address.trim_end_matches('/');
        let upload_url = format!("{}/{}", server_address, upload_path.trim_start_matches('/'));
        let download_base_url = format!(
            "{}/{}/",
            server_address,
            download_base_path.trim_matches('/')
        );

        // Deployments of this service sit behind self-signed certificates;
        // verification stays off to interoperate with them.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            http,
            upload_url,
            download_base_url,
        })
    }

    /// Build a client entirely from the environment
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(None, None, None)
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn download_url(&self, file_name: &str) -> String {
        format!(
            "{}{}",
            self.download_base_url,
            utf8_percent_encode(file_name, PATH_SEGMENT)
        )
    }

    /// Upload `file_path` under its basename with default retry settings.
    pub async fn upload(&self, file_path: &Path) -> Result<(), ClientError> {
        self.upload_with(file_path, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
            .await
    }

    pub async fn upload_with(
        &self,
        file_path: &Path,
        retries: u32,
        retry_delay: Duration,
    ) -> Result<(), ClientError> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let data = tokio::fs::read(file_path).await?;

        let attempts = retries.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let part = Part::bytes(data.clone()).file_name(file_name.clone());
            let form = Form::new().part(UPLOAD_FIELD, part);

            match self.http.post(&self.upload_url).multipart(form).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        tracing::info!(file = %file_name, "upload successful");
                        return Ok(());
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(ClientError::NotFound {
                            url: self.upload_url.clone(),
                        });
                    }
                    last_error = format!("status {status}");
                    tracing::warn!(file = %file_name, attempt, "upload failed: {last_error}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(file = %file_name, attempt, "upload error: {last_error}");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(retry_delay).await;
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Download `file_name` with default retry settings. The file is written
    /// to `save_path`, or to `file_name` in the current directory when none
    /// is given; the written path is returned.
    pub async fn download(
        &self,
        file_name: &str,
        save_path: Option<&Path>,
    ) -> Result<PathBuf, ClientError> {
        self.download_with(file_name, save_path, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
            .await
    }

    pub async fn download_with(
        &self,
        file_name: &str,
        save_path: Option<&Path>,
        retries: u32,
        retry_delay: Duration,
    ) -> Result<PathBuf, ClientError> {
        let url = self.download_url(file_name);
        let save_path = save_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(file_name));

        let attempts = retries.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.http.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(ClientError::NotFound { url });
                    }
                    if status == StatusCode::OK {
                        match response.bytes().await {
                            Ok(bytes) => {
                                tokio::fs::write(&save_path, &bytes).await?;
                                tracing::info!(
                                    file = %file_name,
                                    to = %save_path.display(),
                                    "download complete"
                                );
                                return Ok(save_path);
                            }
                            Err(e) => {
                                last_error = e.to_string();
                                tracing::warn!(
                                    file = %file_name,
                                    attempt,
                                    "download interrupted: {last_error}"
                                );
                            }
                        }
                    } else {
                        last_error = format!("status {status}");
                        tracing::warn!(file = %file_name, attempt, "download failed: {last_error}");
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(file = %file_name, attempt, "download error: {last_error}");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(retry_delay).await;
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts,
            last_error,
        })
    }
}

fn resolve(value: Option<&str>, var: &'static str) -> Result<String, ClientError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ClientError::MissingConfig(var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_assembly_trims_slashes() {
        let client = TransferClient::new(
            Some("https://files.example.com/"),
            Some("/upload"),
            Some("/stored/"),
        )
        .unwrap();
        assert_eq!(client.upload_url(), "https://files.example.com/upload");
        assert_eq!(
            client.download_url("a.txt"),
            "https://files.example.com/stored/a.txt"
        );
    }

    #[test]
    fn test_download_url_escapes_filenames() {
        let client = TransferClient::new(
            Some("http://127.0.0.1:3000"),
            Some("upload"),
            Some("stored"),
        )
        .unwrap();
        assert_eq!(
            client.download_url("my file.txt"),
            "http://127.0.0.1:3000/stored/my%20file.txt"
        );
        assert_eq!(
            client.download_url("a/b.txt"),
            "http://127.0.0.1:3000/stored/a%2Fb.txt"
        );
    }

    #[test]
    fn test_missing_config_names_the_variable() {
        unsafe { std::env::remove_var(DOWNLOAD_BASE_PATH_VAR) };
        let err = TransferClient::new(Some("http://localhost"), Some("/upload"), None)
            .expect_err("must not build without a download base path");
        assert!(matches!(
            err,
            ClientError::MissingConfig(DOWNLOAD_BASE_PATH_VAR)
        ));
    }
}
