//! Image preprocessing ahead of recognition.
//!
//! Key rules:
//! - output is 8-bit RGB
//! - neither dimension exceeds `MAX_DIMENSION`; larger images are
//!   downscaled proportionally, smaller ones are never upscaled
//! - EXIF orientation is applied so phone photos arrive upright
//! - failure never blocks recognition: the original path is returned

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::{debug, warn};

use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Largest edge accepted by the recognition service.
pub const MAX_DIMENSION: u32 = 4096;

/// JPEG re-encode quality.
pub const JPEG_QUALITY: u8 = 95;

// ═══════════════════════════════════════════════════════════
// ImagePreprocessor
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl ImagePreprocessor {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            jpeg_quality,
        }
    }

    /// Normalize the image at `path`, writing to `output` (or in place).
    ///
    /// Returns the path of the image recognition should read. On any
    /// error this is the original, unmodified `path`.
    pub fn preprocess_image(&self, path: &Path, output: Option<&Path>) -> PathBuf {
        match self.try_preprocess(path, output) {
            Ok(out) => out,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Preprocessing failed, using original image");
                path.to_path_buf()
            }
        }
    }

    fn try_preprocess(&self, path: &Path, output: Option<&Path>) -> Result<PathBuf, ExtractionError> {
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes).map_err(|e| {
            ExtractionError::ImageProcessing(format!("Failed to decode image: {e}"))
        })?;
        let (orig_w, orig_h) = img.dimensions();

        let orientation = read_exif_orientation(&bytes);
        let already_rgb = matches!(img, DynamicImage::ImageRgb8(_));
        let (new_w, new_h) = compute_fit_dimensions(orig_w, orig_h, self.max_dimension);
        let needs_resize = (new_w, new_h) != (orig_w, orig_h);

        let out_path = output.unwrap_or(path).to_path_buf();

        if already_rgb && !needs_resize && orientation == 1 {
            // Nothing to normalize: avoid a lossy re-encode
            if out_path != path {
                std::fs::copy(path, &out_path)?;
            }
            debug!(path = %path.display(), "Image already normalized");
            return Ok(out_path);
        }

        let img = apply_orientation(img, orientation);
        let mut rgb = img.to_rgb8();

        // Orientation may have swapped the axes
        let (w, h) = rgb.dimensions();
        let (fit_w, fit_h) = compute_fit_dimensions(w, h, self.max_dimension);
        if (fit_w, fit_h) != (w, h) {
            rgb = image::imageops::resize(&rgb, fit_w, fit_h, FilterType::Lanczos3);
        }

        let format = output_format_for(&out_path, self.jpeg_quality);
        let file = File::create(&out_path)?;
        let mut writer = BufWriter::new(file);
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut writer, format)
            .map_err(|e| ExtractionError::ImageProcessing(format!("Encoding failed: {e}")))?;

        debug!(
            original = format!("{orig_w}x{orig_h}"),
            output = format!("{fit_w}x{fit_h}"),
            orientation,
            path = %out_path.display(),
            "Image preprocessed for recognition"
        );

        Ok(out_path)
    }
}

// ═══════════════════════════════════════════════════════════
// Pure helper functions (reusable)
// ═══════════════════════════════════════════════════════════

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Compute dimensions that fit inside a `max_dim` square while preserving
/// aspect ratio. Small images are NOT upscaled.
pub fn compute_fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }

    let scale = (max_dim as f64 / width as f64).min(max_dim as f64 / height as f64);

    let new_w = ((width as f64 * scale).round() as u32).clamp(1, max_dim);
    let new_h = ((height as f64 * scale).round() as u32).clamp(1, max_dim);

    (new_w, new_h)
}

/// Pick an encoder from the output extension.
/// Formats without an encoder here (tiff, webp) are written as PNG bytes;
/// the recognition service sniffs content, not extensions.
fn output_format_for(path: &Path, jpeg_quality: u8) -> ImageOutputFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => ImageOutputFormat::Jpeg(jpeg_quality),
        "gif" => ImageOutputFormat::Gif,
        "bmp" => ImageOutputFormat::Bmp,
        _ => ImageOutputFormat::Png,
    }
}
