//! Uploaded photo handling: media storage and post-save normalization.
//!
//! Photos are written under the media root as `item_images/<uuid>.<ext>`. After
//! the listing is saved, [`ImageProcessor`] downscales anything larger than
//! 800×800 (aspect ratio kept, Lanczos3), dropping alpha so the result can be
//! stored as RGB, and re-encodes JPEG at quality 85. Images already within
//! bounds are left untouched on disk.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, ImageError,
    ImageFormat, ImageReader,
};
use validator::ValidationError;

use crate::error::{AppError, AppResult};

/// Sub-directory of the media root holding listing photos
pub const ITEM_IMAGES_DIR: &str = "item_images";

const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// A photo received with the post form, checked to be a decodable image
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Sniff the format from the content and decode the whole image, so
    /// truncated or corrupt files are rejected before anything is stored
    pub fn inspect(file_name: Option<String>, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let invalid = || {
            let mut error = ValidationError::new("invalid_image");
            error.message = Some(
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                    .into(),
            );
            error
        };

        let format = image::guess_format(&bytes).map_err(|_| invalid())?;
        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(invalid());
        }

        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .decode()
            .map_err(|_| invalid())?
            .dimensions();

        Ok(Self {
            file_name,
            format,
            width,
            height,
            bytes,
        })
    }

    /// Run [`ImageUpload::inspect`] on the blocking pool
    pub async fn verify(
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> AppResult<Result<Self, ValidationError>> {
        tokio::task::spawn_blocking(move || Self::inspect(file_name, bytes))
            .await
            .map_err(|e| AppError::Internal(format!("Image check failed: {}", e)))
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Local file storage rooted at the configured media directory
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored file
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write the upload under a fresh name and return its path relative to the media root
    pub async fn save(&self, upload: &ImageUpload) -> AppResult<String> {
        let relative = format!("{}/{}.{}", ITEM_IMAGES_DIR, uuid::Uuid::new_v4(), upload.extension());
        let path = self.path_of(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &upload.bytes).await?;

        tracing::debug!(
            "Stored upload {:?} as {} ({} bytes)",
            upload.file_name,
            relative,
            upload.bytes.len()
        );
        Ok(relative)
    }

    /// Best-effort removal, used when the listing could not be saved
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_of(relative)).await {
            tracing::warn!("Could not remove orphaned upload {}: {}", relative, e);
        }
    }
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Within bounds; the file was not rewritten
    Unchanged { width: u32, height: u32 },
    /// Downscaled and re-encoded in place
    Resized { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            jpeg_quality: 85,
        }
    }
}

impl ImageProcessor {
    /// Normalize the image stored at `path`, in place
    pub fn process_file(&self, path: &Path) -> Result<ProcessOutcome, ImageError> {
        let bytes = std::fs::read(path)?;
        let format = image::guess_format(&bytes)?;
        let img = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = img.dimensions();

        match self.normalize(img, format)? {
            Some((encoded, new_width, new_height)) => {
                std::fs::write(path, encoded)?;
                Ok(ProcessOutcome::Resized {
                    width: new_width,
                    height: new_height,
                })
            }
            None => Ok(ProcessOutcome::Unchanged { width, height }),
        }
    }

    /// Downscale and re-encode when larger than the bounding box; `None` when
    /// the image can stay as it is.
    pub fn normalize(
        &self,
        img: DynamicImage,
        format: ImageFormat,
    ) -> Result<Option<(Vec<u8>, u32, u32)>, ImageError> {
        let (width, height) = img.dimensions();
        if width <= self.max_dimension && height <= self.max_dimension {
            return Ok(None);
        }

        let img = if img.color().has_alpha() {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };

        let resized = img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3);
        let (new_width, new_height) = resized.dimensions();

        let mut encoded = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality);
                DynamicImage::ImageRgb8(resized.to_rgb8()).write_with_encoder(encoder)?;
            }
            other => resized.write_to(&mut Cursor::new(&mut encoded), other)?,
        }

        Ok(Some((encoded, new_width, new_height)))
    }

    /// Run [`ImageProcessor::process_file`] on the blocking pool
    pub async fn process(&self, path: PathBuf) -> AppResult<ProcessOutcome> {
        let processor = *self;
        tokio::task::spawn_blocking(move || processor.process_file(&path))
            .await
            .map_err(|e| AppError::Internal(format!("Image task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Image processing failed: {}", e)))
    }
}
