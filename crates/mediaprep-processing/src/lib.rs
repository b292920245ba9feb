//! Mediaprep Processing Library
//!
//! This crate prepares outgoing media before it is sent:
//! - Resource availability observation (fetch trigger + data stream, cancellable)
//! - Metadata transformation (final file size, image size, 90x90 JPEG thumbnail)
//! - Image decoding, EXIF orientation and thumbnail encoding (feature `image`)

#[cfg(feature = "image")]
pub mod image;
pub mod observer;
pub mod transformer;

// Re-export commonly used types
#[cfg(feature = "image")]
pub use image::{ImageOrientation, Thumbnail, ThumbnailGenerator};
pub use observer::{ResourceAvailabilityObserver, ResourceSubscription, SubscriptionCanceller};
pub use transformer::MediaMetadataTransformer;
