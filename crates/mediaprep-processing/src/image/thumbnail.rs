//! Thumbnail derivation for outgoing image files

use crate::image::orientation::ImageOrientation;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};
use mediaprep_core::{MediaError, MediaResult, PixelDimensions, TransformConfig};
use std::io::Cursor;
use std::path::Path;

/// A downscaled rendition and the measurements taken while producing it
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Pixel size of the (oriented) source image
    pub source_dimensions: PixelDimensions,
    /// Pixel size of the encoded thumbnail
    pub dimensions: PixelDimensions,
    /// JPEG-encoded thumbnail
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    bounds: PixelDimensions,
    jpeg_quality: u8,
    respect_exif_orientation: bool,
}

impl ThumbnailGenerator {
    pub fn new(config: &TransformConfig) -> Self {
        ThumbnailGenerator {
            bounds: config.thumbnail_bounds(),
            jpeg_quality: config.jpeg_quality(),
            respect_exif_orientation: config.respect_exif_orientation,
        }
    }

    pub fn bounds(&self) -> PixelDimensions {
        self.bounds
    }

    /// Read the file at `path` and derive a thumbnail from it. Blocking.
    pub fn generate_from_path(&self, path: &Path) -> MediaResult<Thumbnail> {
        let data = std::fs::read(path)?;
        self.generate(&data)
    }

    /// Decode `data`, measure it and render a JPEG thumbnail fitted into the bounds.
    pub fn generate(&self, data: &[u8]) -> MediaResult<Thumbnail> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| MediaError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| MediaError::Decode(e.to_string()))?;

        let img = if self.respect_exif_orientation {
            ImageOrientation::apply_exif_orientation(img, data)
        } else {
            img
        };

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(MediaError::Decode("image has no pixels".to_string()));
        }

        let source_dimensions = PixelDimensions::new(width, height);
        let target = source_dimensions.fitted(self.bounds);

        let scaled = if target == source_dimensions {
            img
        } else {
            let filter = select_filter(source_dimensions, target);
            img.resize_exact(target.width, target.height, filter)
        };

        // Alpha is discarded: the thumbnail is an opaque copy of the source pixels
        let rgb = scaled.to_rgb8();
        let dimensions = PixelDimensions::new(rgb.width(), rgb.height());

        let mut buffer = Vec::with_capacity((dimensions.area() * 3) as usize);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| MediaError::Encode(e.to_string()))?;

        tracing::debug!(
            source_width = source_dimensions.width,
            source_height = source_dimensions.height,
            width = dimensions.width,
            height = dimensions.height,
            size_bytes = buffer.len(),
            "Thumbnail generated"
        );

        Ok(Thumbnail {
            source_dimensions,
            dimensions,
            data: Bytes::from(buffer),
        })
    }
}

/// Select appropriate filter type based on resize ratio
fn select_filter(source: PixelDimensions, target: PixelDimensions) -> FilterType {
    let width_ratio = source.width as f32 / target.width.max(1) as f32;
    let height_ratio = source.height as f32 / target.height.max(1) as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}
