pub mod media;
pub mod resource;
pub mod transform;

pub use media::{
    replace_image_size, FileMedia, ImageMedia, ImageRepresentation, MediaAttribute,
    MediaDescriptor, PixelDimensions,
};
pub use resource::{FetchParameters, FetchPriority, ResourceDataOption, ResourceId, ResourceSnapshot};
pub use transform::{ExecutionContext, TransformMode, TransformOutcome};
