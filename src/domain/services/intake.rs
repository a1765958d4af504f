//! Image intake
//!
//! Validates an upload and writes it to a scoped temporary file. The file
//! lives exactly as long as the returned [`TempImage`] guard.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::domain::models::{ImageExtension, UploadedImage};
use crate::shared::errors::{AppError, Result};
use crate::shared::logging::log_temp_release_error;

/// Check size, emptiness and content of an upload before anything is written
pub fn validate_upload(upload: &UploadedImage, max_size: usize) -> Result<()> {
    let size = upload.size();
    if size == 0 {
        return Err(AppError::EmptyUpload);
    }
    if size > max_size {
        return Err(AppError::UploadTooLarge { size, max: max_size });
    }

    let format = image::guess_format(&upload.bytes)
        .map_err(|e| AppError::UnreadableImage(e.to_string()))?;

    let sniffed = match format {
        image::ImageFormat::Jpeg => ImageExtension::Jpeg,
        image::ImageFormat::Png => ImageExtension::Png,
        other => {
            return Err(AppError::UnreadableImage(format!(
                "content is {:?}, expected JPEG or PNG",
                other
            )));
        }
    };

    if sniffed.media_type() != upload.extension.media_type() {
        tracing::warn!(
            filename = %upload.filename,
            declared = upload.extension.as_str(),
            detected = sniffed.as_str(),
            "Upload extension does not match its content"
        );
    }

    Ok(())
}

/// Scoped temporary copy of an upload.
///
/// `release()` removes the file and reports failures; dropping the guard
/// without releasing it removes the file too.
#[derive(Debug)]
pub struct TempImage {
    file: NamedTempFile,
    extension: ImageExtension,
}

impl TempImage {
    /// Validate `upload` and persist its bytes
    pub fn acquire(upload: &UploadedImage, max_size: usize) -> Result<Self> {
        validate_upload(upload, max_size)?;

        let mut file = tempfile::Builder::new()
            .prefix("ad-upload-")
            .suffix(&format!(".{}", upload.extension.as_str()))
            .tempfile()?;
        file.write_all(&upload.bytes)?;
        file.flush()?;

        tracing::debug!(
            path = %file.path().display(),
            size = upload.size(),
            "Upload written to temporary file"
        );

        Ok(Self {
            file,
            extension: upload.extension,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn extension(&self) -> ImageExtension {
        self.extension
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }

    /// Delete the file now
    pub fn release(self) -> Result<()> {
        let path = self.file.path().display().to_string();
        self.file.close().map_err(|e| {
            log_temp_release_error(&path, &e);
            AppError::IoError(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"\0\0\0\rIHDR-not-really-an-image");
        bytes
    }

    #[tokio::test]
    async fn test_temp_file_matches_upload() {
        let upload = UploadedImage::new("car.png", png_bytes()).unwrap();
        let temp = TempImage::acquire(&upload, 1024).unwrap();

        assert!(temp.path().exists());
        assert_eq!(temp.path().extension().unwrap(), "png");
        assert_eq!(temp.read_bytes().await.unwrap(), upload.bytes);
        assert_eq!(std::fs::read(temp.path()).unwrap(), upload.bytes);
    }

    #[test]
    fn test_release_removes_file() {
        let upload = UploadedImage::new("car.png", png_bytes()).unwrap();
        let temp = TempImage::acquire(&upload, 1024).unwrap();
        let path = temp.path().to_path_buf();

        temp.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file_on_early_exit() {
        fn failing_step(temp: &TempImage) -> Result<()> {
            assert!(temp.path().exists());
            Err(AppError::Hosting("upstream down".into()))
        }

        let upload = UploadedImage::new("car.png", png_bytes()).unwrap();
        let path = {
            let temp = TempImage::acquire(&upload, 1024).unwrap();
            let path = temp.path().to_path_buf();
            assert!(failing_step(&temp).is_err());
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_upload_rejected() {
        let upload = UploadedImage::new("car.jpg", Vec::new()).unwrap();
        assert!(matches!(TempImage::acquire(&upload, 1024), Err(AppError::EmptyUpload)));
    }

    #[test]
    fn test_unreadable_upload_rejected() {
        let upload = UploadedImage::new("car.jpg", b"definitely not an image".to_vec()).unwrap();
        assert!(matches!(
            TempImage::acquire(&upload, 1024),
            Err(AppError::UnreadableImage(_))
        ));
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let upload = UploadedImage::new("car.png", png_bytes()).unwrap();
        assert!(matches!(
            validate_upload(&upload, 4),
            Err(AppError::UploadTooLarge { max: 4, .. })
        ));
    }

    #[test]
    fn test_jpeg_signature_accepted() {
        let upload = UploadedImage::new("photo.jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]).unwrap();
        assert!(validate_upload(&upload, 1024).is_ok());
    }
}
