use image::{imageops, DynamicImage};
use std::io::Cursor;

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read EXIF orientation tag from image data.
    ///
    /// Returns orientation value (1–8), or 1 (normal) if the tag is missing or invalid.
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(_) => return 1,
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| (1..=8).contains(value))
            .unwrap_or(1)
    }

    /// Get rotation and flip operations needed for a given EXIF orientation
    /// Returns (rotate_angle, flip_horizontal, flip_vertical), rotation applied first
    pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(90), true, false),   // Transpose
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(270), true, false),  // Transverse
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),
        }
    }

    /// Apply EXIF orientation correction to an image
    pub fn apply_exif_orientation(img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        if orientation == 1 {
            return img;
        }

        let (rotate, flip_h, flip_v) = Self::get_orientation_transforms(orientation);

        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        let mut img = img;
        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }
        if flip_h {
            img = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
        }
        if flip_v {
            img = DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()));
        }

        img
    }

    /// Rotate image by 90, 180 or 270 degrees clockwise; other angles are ignored
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}
