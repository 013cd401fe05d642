use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ResumeDetail, ResumeSummary, UploadResponse};

/// Multipart field the backend reads the PDF from.
pub const UPLOAD_FIELD: &str = "resume";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status code {code}")]
    Status { code: u16, detail: Option<String> },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiError {
    /// Text for the alert shown to the user: the server's `detail` when it sent
    /// one, otherwise a generic description of what went wrong.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Status { code, detail: None } => {
                format!("Request failed with status code {}", code)
            }
            ApiError::Transport(e) if e.is_timeout() => "Request timed out".to_string(),
            ApiError::Transport(e) if e.is_connect() => {
                "Network Error: could not reach the resume API".to_string()
            }
            ApiError::Transport(e) => e.to_string(),
            ApiError::Decode(msg) => format!("Unexpected response from server: {}", msg),
            ApiError::File { .. } => self.to_string(),
        }
    }
}

/// Pull the `detail` field out of an error body. FastAPI sends a string for
/// raised errors and a list of objects for validation failures.
pub fn parse_error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The three calls the client makes against the resume backend.
#[async_trait]
pub trait ResumeApi: Send + Sync {
    async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, ApiError>;
    async fn get_resume(&self, id: i64) -> Result<ResumeDetail, ApiError>;
    async fn upload_resume(&self, file: &Path) -> Result<ResumeDetail, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpResumeApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpResumeApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/resumes{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = parse_error_detail(&body);
            tracing::warn!(status = status.as_u16(), detail = ?detail, "resume API returned an error");
            return Err(ApiError::Status {
                code: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResumeApi for HttpResumeApi {
    async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, ApiError> {
        let url = self.url("");
        tracing::debug!(%url, "listing resumes");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn get_resume(&self, id: i64) -> Result<ResumeDetail, ApiError> {
        let url = self.url(&format!("/{}", id));
        tracing::debug!(%url, id, "fetching resume detail");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn upload_resume(&self, file: &Path) -> Result<ResumeDetail, ApiError> {
        let bytes = tokio::fs::read(file).await.map_err(|source| ApiError::File {
            path: file.to_path_buf(),
            source,
        })?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());

        let url = self.url("/upload");
        tracing::info!(%url, file = %file_name, size = bytes.len(), "uploading resume");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let body: UploadResponse = Self::read_json(response).await?;
        Ok(body.into_detail())
    }
}
