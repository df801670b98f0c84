//! Image validation and pre-upload optimization.
//!
//! Uploaded pictures are re-encoded to WebP with the longest edge capped at
//! 1920 px, then shrunk further until the encoded file fits in 5 MB. Validation only
//! looks at the content type: any `image/*` is accepted and size is left to the
//! optimizer.

use crate::errors::{Error, Result};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::{fmt, io::Cursor, path::Path};

/// Upper bound for an optimized file, in bytes.
pub const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;
/// Maximum width of an optimized image.
pub const MAX_WIDTH: u32 = 1920;
/// Maximum height of an optimized image.
pub const MAX_HEIGHT: u32 = 1080;

const OPTIMIZED_CONTENT_TYPE: &str = "image/webp";
const OPTIMIZED_EXTENSION: &str = "webp";

/// An in-memory file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, used for the extension of the stored object
    pub file_name: String,
    /// MIME type as reported by the client
    pub content_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Bundles a file name, content type and contents.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extension of the file name, if it has one.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Checks that a selected file is an image.
///
/// # Errors
/// Returns `Error::InvalidImage` when the file is empty or its content type is not `image/*`.
pub fn validate_image(file: &ImageFile) -> Result<()> {
    if file.is_empty() {
        return Err(Error::InvalidImage {
            reason: "No se seleccionó ningún archivo".to_string(),
        });
    }

    if !file.content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(Error::InvalidImage {
            reason: "El archivo debe ser una imagen".to_string(),
        });
    }

    Ok(())
}

/// Re-encodes an image to WebP within the size and dimension limits.
///
/// This is CPU-bound; async callers should run it on a blocking thread.
///
/// # Errors
/// Returns `Error::ImageOptimization` if the bytes cannot be decoded or re-encoded.
pub fn optimize_image(file: &ImageFile) -> Result<ImageFile> {
    let decoded = image::load_from_memory(&file.bytes).map_err(|e| Error::ImageOptimization {
        message: e.to_string(),
    })?;

    let longest_edge = MAX_WIDTH.max(MAX_HEIGHT);
    let mut current = if decoded.width() > longest_edge || decoded.height() > longest_edge {
        decoded.resize(longest_edge, longest_edge, FilterType::Lanczos3)
    } else {
        decoded
    };

    loop {
        let bytes = encode_webp(&current)?;
        if bytes.len() <= MAX_FILE_SIZE_BYTES {
            tracing::debug!(
                "Optimized {} from {} to {} bytes ({}x{})",
                file.file_name,
                file.len(),
                bytes.len(),
                current.width(),
                current.height()
            );
            return Ok(ImageFile::new(
                optimized_file_name(&file.file_name),
                OPTIMIZED_CONTENT_TYPE,
                bytes,
            ));
        }

        let (width, height) = (current.width(), current.height());
        if width <= 1 && height <= 1 {
            return Err(Error::ImageOptimization {
                message: "image cannot be reduced below the size limit".to_string(),
            });
        }
        current = current.resize(
            (width * 3 / 4).max(1),
            (height * 3 / 4).max(1),
            FilterType::Triangle,
        );
    }
}

fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    // The WebP encoder only takes 8-bit RGB(A)
    let normalized = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    let mut buffer = Cursor::new(Vec::new());
    normalized
        .write_to(&mut buffer, ImageFormat::WebP)
        .map_err(|e| Error::ImageOptimization {
            message: e.to_string(),
        })?;
    Ok(buffer.into_inner())
}

fn optimized_file_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image");
    format!("{stem}.{OPTIMIZED_EXTENSION}")
}
