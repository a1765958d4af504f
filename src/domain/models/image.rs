use serde::{Deserialize, Serialize};

use crate::shared::errors::{AppError, Result};

/// `accept` attribute for the file input
pub const UPLOAD_ACCEPT: &str = ".jpg,.jpeg,.png,image/jpeg,image/png";

/// Maximum image size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Upload size the server accepts; published to the page so both sides agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl UploadLimits {
    /// Checks that need only the file name and size, run before anything is sent
    pub fn check(&self, filename: &str, size: usize) -> Result<ImageExtension> {
        let extension = ImageExtension::from_filename(filename)?;
        if size == 0 {
            return Err(AppError::EmptyUpload);
        }
        if size > self.max_upload_bytes {
            return Err(AppError::UploadTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(extension)
    }

    /// Hint shown under the upload control
    pub fn hint(&self) -> String {
        const KIB: usize = 1024;
        const MIB: usize = 1024 * 1024;

        let max = self.max_upload_bytes;
        let limit = if max >= MIB && max % MIB == 0 {
            format!("{}MB", max / MIB)
        } else if max >= KIB {
            format!("{}KB", max / KIB)
        } else {
            format!("{} bytes", max)
        };
        format!("Limit {} per file • JPG, PNG, JPEG", limit)
    }
}

/// Declared image extension of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Png,
}

impl ImageExtension {
    /// Parse the extension of `filename`, case-insensitively
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "jpg" => Ok(ImageExtension::Jpg),
            "jpeg" => Ok(ImageExtension::Jpeg),
            "png" => Ok(ImageExtension::Png),
            "" => Err(AppError::UnsupportedExtension(format!("{} (no extension)", filename))),
            other => Err(AppError::UnsupportedExtension(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Png => "png",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageExtension::Jpg | ImageExtension::Jpeg => "image/jpeg",
            ImageExtension::Png => "image/png",
        }
    }
}

/// Raw upload as received from the page
#[derive(Clone, PartialEq)]
pub struct UploadedImage {
    pub filename: String,
    pub extension: ImageExtension,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        let extension = ImageExtension::from_filename(&filename)?;
        Ok(Self {
            filename,
            extension,
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("filename", &self.filename)
            .field("extension", &self.extension)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Publicly resolvable copy of the upload on the hosting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedImage {
    pub public_url: String,
    /// Handle the hosting service hands out for deletion; recorded, never used
    #[serde(default)]
    pub delete_hash: Option<String>,
}
