use crate::draft::Photo;
use crate::item::PhotoUrl;
use log::{error, info};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

// Multipart part that carries the photo
const IMAGE_PART: &str = "image";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to send upload request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Asset host responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Asset host returned an unreadable body: {0}")]
    InvalidBody(String),
    #[error("Asset host response has no image url")]
    MissingUrl,
}

#[async_trait::async_trait]
pub trait AssetUploader: Send + Sync {
    /// Upload once and return the hosted URL, no retry
    async fn upload(&self, photo: &Photo) -> Result<PhotoUrl, UploadError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    image: Option<UploadImage>,
}

#[derive(Debug, Deserialize)]
struct UploadImage {
    url: Option<String>,
}

/// Extract `data.image.url` from the asset host's JSON response
pub fn parse_upload_response(bytes: &[u8]) -> Result<PhotoUrl, UploadError> {
    let response = serde_json::from_slice::<UploadResponse>(bytes)
        .map_err(|e| UploadError::InvalidBody(e.to_string()))?;

    response
        .data
        .and_then(|d| d.image)
        .and_then(|i| i.url)
        .and_then(PhotoUrl::new)
        .ok_or(UploadError::MissingUrl)
}

pub struct HttpAssetUploader {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl HttpAssetUploader {
    pub fn new(client: reqwest::Client, upload_url: String, api_key: String) -> Self {
        HttpAssetUploader {
            client,
            upload_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl AssetUploader for HttpAssetUploader {
    async fn upload(&self, photo: &Photo) -> Result<PhotoUrl, UploadError> {
        info!(
            "Uploading photo: {}, {} bytes",
            &photo.file_name,
            photo.bytes.len()
        );

        let part = reqwest::multipart::Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)?;
        let form = reqwest::multipart::Form::new().part(IMAGE_PART, part);

        let resp = self
            .client
            .post(&self.upload_url)
            .query(&[("key", &self.api_key)])
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            error!("Asset host rejected upload: {}", status);
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }

        let url = parse_upload_response(&bytes)?;
        info!("Photo hosted at: {}", &url);
        Ok(url)
    }
}

pub(crate) fn truncate_body(bytes: &[u8]) -> String {
    const MAX_BODY_CHARS: usize = 200;
    String::from_utf8_lossy(bytes).chars().take(MAX_BODY_CHARS).collect()
}
