//! Cover thumbnail rendering
//!
//! Covers are cropped to the target aspect ratio around the image center and
//! then scaled to the exact target size, so every thumbnail fills its canvas.

use super::MetadataError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Target size and encoding quality of cover thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 300,
            height: 400,
            quality: 85,
        }
    }
}

impl ThumbnailSpec {
    /// Canvas aspect ratio as width:height
    pub const ASPECT: (u32, u32) = (3, 4);

    /// Same quality with a 3:4 canvas `width` pixels wide
    ///
    /// Returns `None` unless `width` is a positive multiple of 3.
    #[must_use]
    pub const fn with_width(self, width: u32) -> Option<Self> {
        let (w, h) = Self::ASPECT;
        if width == 0 || width % w != 0 {
            return None;
        }
        Some(Self {
            width,
            height: width / w * h,
            quality: self.quality,
        })
    }

    /// Same quality with a 3:4 canvas `height` pixels high
    ///
    /// Returns `None` unless `height` is a positive multiple of 4.
    #[must_use]
    pub const fn with_height(self, height: u32) -> Option<Self> {
        let (w, h) = Self::ASPECT;
        if height == 0 || height % h != 0 {
            return None;
        }
        Some(Self {
            width: height / h * w,
            height,
            quality: self.quality,
        })
    }

    #[must_use]
    pub fn has_canvas_aspect(&self) -> bool {
        let (w, h) = Self::ASPECT;
        u64::from(self.width) * u64::from(h) == u64::from(self.height) * u64::from(w)
    }

    /// This spec if its canvas is 3:4, otherwise the 3:4 canvas closest to its width
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.width > 0 && self.has_canvas_aspect() {
            return self;
        }
        let (w, _) = Self::ASPECT;
        let width = (self.width - self.width % w).max(w);
        tracing::warn!(width = self.width, height = self.height, "thumbnail size is not 3:4, adjusted");
        self.with_width(width).unwrap_or_default()
    }
}

/// Source rectangle selected for a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered rectangle of the source with the target aspect ratio
///
/// Returns `None` when either size has a zero dimension.
#[must_use]
pub fn crop_to_fill(src_width: u32, src_height: u32, target_width: u32, target_height: u32) -> Option<CropRect> {
    if src_width == 0 || src_height == 0 || target_width == 0 || target_height == 0 {
        return None;
    }

    let target_aspect = f64::from(target_width) / f64::from(target_height);
    let src_aspect = f64::from(src_width) / f64::from(src_height);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rect = if src_aspect > target_aspect {
        // too wide: keep full height
        let width = ((f64::from(src_height) * target_aspect).floor() as u32).clamp(1, src_width);
        CropRect {
            x: (src_width - width) / 2,
            y: 0,
            width,
            height: src_height,
        }
    } else {
        let height = ((f64::from(src_width) / target_aspect).floor() as u32).clamp(1, src_height);
        CropRect {
            x: 0,
            y: (src_height - height) / 2,
            width: src_width,
            height,
        }
    };

    Some(rect)
}

/// Decode a cover image and render it as a JPEG thumbnail
///
/// # Errors
///
/// Returns `MetadataError::Image` if the bytes cannot be decoded or encoded
/// and `MetadataError::EmptyImage` for images without pixels.
pub fn render_cover(bytes: &[u8], spec: &ThumbnailSpec) -> Result<Vec<u8>, MetadataError> {
    let source = image::load_from_memory(bytes)?;
    let rect = crop_to_fill(source.width(), source.height(), spec.width, spec.height).ok_or(
        MetadataError::EmptyImage {
            width: source.width(),
            height: source.height(),
        },
    )?;

    let thumb = source
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .resize_exact(spec.width, spec.height, FilterType::Lanczos3)
        .to_rgb8();

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, spec.quality.clamp(1, 100));
    thumb.write_with_encoder(encoder)?;
    Ok(out)
}

/// Render a cover thumbnail and write it to `dest`
///
/// # Errors
///
/// Returns `MetadataError` if rendering fails or `dest` cannot be written.
pub fn write_cover_thumbnail(bytes: &[u8], spec: &ThumbnailSpec, dest: &Path) -> Result<(), MetadataError> {
    let encoded = render_cover(bytes, spec)?;
    let io_error = |source| MetadataError::Io {
        path: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(dest, encoded).map_err(io_error)
}
