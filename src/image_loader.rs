//! Image loading for assay photographs
//!
//! Decodes PNG and JPEG files with the `image` crate into the RGBA8 buffer
//! the region sampler reads. EXIF orientation is not applied: region
//! coordinates refer to the stored pixel grid.

use crate::engine::PixelBufferData;
use crate::error::{AnalysisError, Result};
use image::RgbaImage;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

/// Load an image from disk as RGBA8
///
/// # Errors
///
/// Returns `AnalysisError::InvalidParameter` for an unsupported extension
/// and `AnalysisError::ImageLoadError` when the file cannot be opened or
/// decoded.
///
/// # Example
///
/// ```rust,no_run
/// use chroma_assay::image_loader::load_rgba;
/// use std::path::Path;
///
/// let image = load_rgba(Path::new("plate.png"))?;
/// println!("Loaded image: {}x{}", image.width(), image.height());
/// # Ok::<(), chroma_assay::AnalysisError>(())
/// ```
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    if ImageFormat::from_extension(path).is_none() {
        return Err(AnalysisError::InvalidParameter {
            parameter: "image format".into(),
            value: path.display().to_string(),
        });
    }

    let reader = image::ImageReader::open(path).map_err(|e| {
        AnalysisError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;
    let reader = reader.with_guessed_format().map_err(|e| {
        AnalysisError::image_load(format!("Failed to read image header: {}", path.display()), e)
    })?;
    let decoded = reader.decode().map_err(|e| {
        AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    Ok(decoded.to_rgba8())
}

/// Load an image straight into the message-boundary buffer form
pub fn load_pixel_buffer(path: &Path) -> Result<PixelBufferData> {
    load_rgba(path).map(|image| PixelBufferData::from_image(&image))
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &["jpg", "jpeg", "png"]
}
