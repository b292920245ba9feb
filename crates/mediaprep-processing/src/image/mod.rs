//! Image processing module
//!
//! - EXIF-aware orientation (orientation)
//! - Thumbnail derivation for outgoing image files (thumbnail)

pub mod orientation;
pub mod thumbnail;

pub use orientation::ImageOrientation;
pub use thumbnail::{Thumbnail, ThumbnailGenerator};
