//! `POST /upload`: relay a raw image to the media host and return its URL

use crate::config::CloudinaryCredentials;
use crate::{AppState, ErrorBody};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const UPLOAD_FAILED: &str = "Image upload failed";
pub const IMAGE_REQUIRED: &str = "Image is required";
pub const NOT_AN_IMAGE: &str = "Only image uploads are supported";

/// Request bodies above this are rejected before the handler runs
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const UPLOAD_FOLDER: &str = "bup-issues";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Cloudinary credentials are not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media host returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Image hosting backend
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<String, MediaError>;
}

pub struct Cloudinary {
    http: reqwest::Client,
    credentials: Option<CloudinaryCredentials>,
}

impl Cloudinary {
    pub fn new(credentials: Option<CloudinaryCredentials>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }
}

/// Parameters covered by the upload signature, sorted by name
pub fn signature_payload(folder: &str, public_id: &str, timestamp: i64) -> String {
    format!("folder={folder}&public_id={public_id}&timestamp={timestamp}")
}

/// Hex SHA-256 of the sorted parameters followed by the API secret
pub fn sign(payload: &str, api_secret: &str) -> String {
    let digest = Sha256::new()
        .chain_update(payload.as_bytes())
        .chain_update(api_secret.as_bytes())
        .finalize();
    hex::encode(digest)
}

#[derive(Serialize)]
struct SignedUpload<'a> {
    file: String,
    api_key: &'a str,
    timestamp: i64,
    folder: &'a str,
    public_id: &'a str,
    signature: String,
    signature_algorithm: &'static str,
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
}

#[async_trait]
impl MediaHost for Cloudinary {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<String, MediaError> {
        let creds = self.credentials.as_ref().ok_or(MediaError::NotConfigured)?;

        let public_id = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign(
            &signature_payload(UPLOAD_FOLDER, &public_id, timestamp),
            &creds.api_secret,
        );

        let body = SignedUpload {
            file: format!("data:{};base64,{}", content_type, STANDARD.encode(bytes)),
            api_key: &creds.api_key,
            timestamp,
            folder: UPLOAD_FOLDER,
            public_id: &public_id,
            signature,
            signature_algorithm: "sha256",
        };

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            creds.cloud_name
        );
        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let result: UploadResult = response.json().await?;
        tracing::debug!(%public_id, "image stored");
        Ok(result.secure_url)
    }
}

#[derive(Debug, Serialize)]
pub struct UploadReply {
    pub url: String,
}

pub async fn upload(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if body.is_empty() {
        return ErrorBody::response(StatusCode::BAD_REQUEST, IMAGE_REQUIRED);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");
    if !content_type.starts_with("image/") {
        return ErrorBody::response(StatusCode::BAD_REQUEST, NOT_AN_IMAGE);
    }

    match state.media.upload(&body, content_type).await {
        Ok(url) => Json(UploadReply { url }).into_response(),
        Err(e) => {
            tracing::error!(bytes = body.len(), "image upload failed: {}", e);
            ErrorBody::response(StatusCode::BAD_GATEWAY, UPLOAD_FAILED)
        }
    }
}
