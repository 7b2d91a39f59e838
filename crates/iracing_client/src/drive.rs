//! Google Drive upload.
//!
//! Access tokens come from a [`TokenProvider`]; the default one runs the
//! interactive installed-app OAuth flow and caches tokens on disk. Uploads
//! send metadata and content together as a single multipart request.

use crate::IracingError;
use crate::config::DriveConfig;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, IracingError>;
}

/// Browser-based OAuth for installed applications.
///
/// Blocks until the user grants access in the browser or `timeout` elapses.
#[derive(Clone, Debug)]
pub struct InstalledFlowTokenProvider {
    client_secrets: PathBuf,
    token_cache: PathBuf,
    timeout: Duration,
}

impl InstalledFlowTokenProvider {
    pub fn new(client_secrets: PathBuf, token_cache: PathBuf, timeout: Duration) -> Self {
        Self {
            client_secrets,
            token_cache,
            timeout,
        }
    }

    pub fn from_config(cfg: &DriveConfig) -> Self {
        Self::new(
            cfg.client_secrets.clone(),
            cfg.token_cache.clone(),
            cfg.auth_timeout,
        )
    }

    async fn run_flow(&self) -> Result<SecretString, IracingError> {
        let secret = yup_oauth2::read_application_secret(&self.client_secrets)
            .await
            .map_err(|e| {
                IracingError::OAuth(format!(
                    "reading client secrets {}: {e}",
                    self.client_secrets.display()
                ))
            })?;
        let auth =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .persist_tokens_to_disk(&self.token_cache)
                .build()
                .await
                .map_err(|e| IracingError::OAuth(e.to_string()))?;

        let token = auth
            .token(&[DRIVE_FILE_SCOPE])
            .await
            .map_err(|e| IracingError::OAuth(e.to_string()))?;
        token
            .token()
            .map(|t| SecretString::new(t.into()))
            .ok_or_else(|| IracingError::OAuth("authorization returned no access token".into()))
    }
}

#[async_trait]
impl TokenProvider for InstalledFlowTokenProvider {
    async fn access_token(&self) -> Result<SecretString, IracingError> {
        tracing::info!("requesting Google Drive authorization");
        tokio::time::timeout(self.timeout, self.run_flow())
            .await
            .map_err(|_| IracingError::Timeout(self.timeout))?
    }
}

/// A file stored on Drive.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait DriveUploader: Send + Sync {
    /// Upload the file at `path`, titled with its base name.
    async fn upload(&self, path: &Path) -> Result<UploadedFile, IracingError>;
}

/// Drive v3 uploader using reqwest.
pub struct GoogleDriveUploader<T> {
    base_url: String,
    tokens: T,
    client: reqwest::Client,
}

impl<T: TokenProvider> GoogleDriveUploader<T> {
    pub fn new(base_url: &str, tokens: T, timeout: Duration) -> Result<Self, IracingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            client,
        })
    }
}

/// Pick a multipart boundary that does not occur in `content`.
fn boundary_for(content: &[u8]) -> String {
    let mut boundary = String::from("iracing_pull_upload");
    while content
        .windows(boundary.len())
        .any(|w| w == boundary.as_bytes())
    {
        boundary.push('_');
    }
    boundary
}

/// Build a `multipart/related` body: JSON metadata part, then the media part.
pub fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    media_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: {media_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl<T: TokenProvider> DriveUploader for GoogleDriveUploader<T> {
    async fn upload(&self, path: &Path) -> Result<UploadedFile, IracingError> {
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                IracingError::Config(format!("{} has no file name", path.display()))
            })?;
        let content = tokio::fs::read(path).await?;
        let token = self.tokens.access_token().await?;

        // Metadata and content travel in one request, so a failure leaves
        // nothing behind on Drive.
        let boundary = boundary_for(&content);
        let metadata = serde_json::json!({ "name": title, "mimeType": "text/csv" });
        let body = multipart_related_body(&boundary, &metadata, "text/csv", &content);

        let resp = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .query(&[("uploadType", "multipart")])
            .bearer_auth(token.expose_secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IracingError::Upload {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let uploaded: UploadedFile = resp.json().await?;
        tracing::info!(id = %uploaded.id, name = %uploaded.name, "uploaded to drive");
        Ok(uploaded)
    }
}
