//! Mediaprep Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the storage and processing layers of Mediaprep.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::TransformConfig;
pub use error::{LogLevel, MediaError, MediaResult};
pub use models::{
    replace_image_size, ExecutionContext, FetchParameters, FetchPriority, FileMedia, ImageMedia,
    ImageRepresentation, MediaAttribute, MediaDescriptor, PixelDimensions, ResourceDataOption,
    ResourceId, ResourceSnapshot, TransformMode, TransformOutcome,
};
