//! Imgur image hosting client
//!
//! Anonymous uploads: the file is sent base64-encoded and authorised with the
//! application's client id. Uploaded images are never deleted.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::models::{HostedImage, HostingCredentials};
use crate::shared::errors::{AppError, Result};

pub const DEFAULT_IMGUR_API_BASE: &str = "https://api.imgur.com/3";

const SERVICE_NAME: &str = "Imgur";

/// Publishes a local image file at a public URL
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, path: &Path, credentials: &HostingCredentials) -> Result<HostedImage>;
}

/// Imgur response envelope
#[derive(Debug, Deserialize)]
struct ImgurEnvelope {
    #[serde(default)]
    data: Option<ImgurImage>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    status: u16,
}

#[derive(Debug, Deserialize)]
struct ImgurImage {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    deletehash: Option<String>,
}

#[derive(Clone)]
pub struct ImgurClient {
    client: Client,
    api_base: String,
}

impl ImgurClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgurClient {
    async fn upload(&self, path: &Path, credentials: &HostingCredentials) -> Result<HostedImage> {
        let bytes = tokio::fs::read(path).await?;
        let encoded = STANDARD.encode(&bytes);

        tracing::debug!(
            path = %path.display(),
            size = bytes.len(),
            "Uploading image to Imgur"
        );

        let response = self
            .client
            .post(format!("{}/image", self.api_base))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", credentials.client_id),
            )
            .form(&[("image", encoded.as_str()), ("type", "base64")])
            .send()
            .await
            .map_err(|e| AppError::Hosting(format!("upload request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized {
                service: SERVICE_NAME,
                message: format!("{} {}", status, message.trim()),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Hosting(format!(
                "upload returned {}: {}",
                status,
                message.trim()
            )));
        }

        let envelope: ImgurEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::Hosting(format!("unexpected upload response: {}", e)))?;

        if !envelope.success {
            return Err(AppError::Hosting(format!(
                "upload was not accepted (status {})",
                envelope.status
            )));
        }

        let image = envelope
            .data
            .ok_or_else(|| AppError::Hosting("upload response has no data".to_string()))?;
        let public_url = image
            .link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| AppError::Hosting("upload response has no link".to_string()))?;

        Ok(HostedImage {
            public_url,
            delete_hash: image.deletehash,
        })
    }
}
