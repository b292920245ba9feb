//! Outbound media descriptors
//!
//! Descriptors are immutable values. Every update returns a new descriptor, leaving
//! the original untouched so that concurrent readers never observe a half-applied change.

use crate::constants::IMAGE_MIME_PREFIX;
use crate::models::resource::ResourceId;
use serde::{Deserialize, Serialize};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

impl PixelDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        PixelDimensions { width, height }
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Largest size inside `bounds` that keeps the aspect ratio without upscaling.
    ///
    /// The shrunk side is floored and never drops below one pixel.
    pub fn fitted(self, bounds: PixelDimensions) -> PixelDimensions {
        let mut width = self.width as u64;
        let mut height = self.height as u64;

        if width > bounds.width as u64 {
            height = (height * bounds.width as u64 / width.max(1)).max(1);
            width = bounds.width as u64;
        }
        if height > bounds.height as u64 {
            width = (width * bounds.height as u64 / height.max(1)).max(1);
            height = bounds.height as u64;
        }

        PixelDimensions::new(width as u32, height as u32)
    }

    pub fn fits_within(self, bounds: PixelDimensions) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

/// Typed file attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MediaAttribute {
    ImageSize(PixelDimensions),
    FileName(String),
    Audio {
        duration_secs: u32,
        title: Option<String>,
        performer: Option<String>,
        voice: bool,
    },
    Video {
        duration_secs: u32,
        dimensions: PixelDimensions,
    },
    Animated,
    HasLinkedStickers,
}

impl MediaAttribute {
    pub fn image_size(&self) -> Option<PixelDimensions> {
        match self {
            MediaAttribute::ImageSize(dimensions) => Some(*dimensions),
            _ => None,
        }
    }
}

/// Return `attributes` with every `ImageSize` removed and `dimensions` appended.
///
/// Keeps the at-most-one `ImageSize` invariant without mutating the input.
pub fn replace_image_size(
    attributes: &[MediaAttribute],
    dimensions: PixelDimensions,
) -> Vec<MediaAttribute> {
    attributes
        .iter()
        .filter(|attribute| attribute.image_size().is_none())
        .cloned()
        .chain(std::iter::once(MediaAttribute::ImageSize(dimensions)))
        .collect()
}

/// A sized rendition of an image stored as its own resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRepresentation {
    pub dimensions: PixelDimensions,
    pub resource: ResourceId,
}

impl ImageRepresentation {
    pub fn new(dimensions: PixelDimensions, resource: ResourceId) -> Self {
        ImageRepresentation {
            dimensions,
            resource,
        }
    }
}

/// An outgoing file (document, audio, video, raw image upload...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMedia {
    pub resource: ResourceId,
    pub mime_type: String,
    pub size: u64,
    pub attributes: Vec<MediaAttribute>,
    pub preview_representations: Vec<ImageRepresentation>,
}

impl FileMedia {
    pub fn new(resource: ResourceId, mime_type: impl Into<String>) -> Self {
        FileMedia {
            resource,
            mime_type: mime_type.into(),
            size: 0,
            attributes: Vec::new(),
            preview_representations: Vec::new(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with(IMAGE_MIME_PREFIX)
    }

    pub fn image_size(&self) -> Option<PixelDimensions> {
        self.attributes.iter().find_map(MediaAttribute::image_size)
    }

    pub fn with_updated_size(&self, size: u64) -> Self {
        FileMedia {
            size,
            ..self.clone()
        }
    }

    pub fn with_updated_attributes(&self, attributes: Vec<MediaAttribute>) -> Self {
        FileMedia {
            attributes,
            ..self.clone()
        }
    }

    pub fn with_updated_preview_representations(
        &self,
        preview_representations: Vec<ImageRepresentation>,
    ) -> Self {
        FileMedia {
            preview_representations,
            ..self.clone()
        }
    }
}

/// An outgoing photo, described by its renditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMedia {
    pub representations: Vec<ImageRepresentation>,
}

impl ImageMedia {
    pub fn new(representations: Vec<ImageRepresentation>) -> Self {
        ImageMedia { representations }
    }

    /// Representation with the largest pixel area. The first one wins a tie.
    pub fn largest_representation(&self) -> Option<&ImageRepresentation> {
        self.representations.iter().fold(None, |best, candidate| match best {
            Some(current) if current.dimensions.area() >= candidate.dimensions.area() => {
                Some(current)
            }
            _ => Some(candidate),
        })
    }
}

/// Media attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media", rename_all = "snake_case")]
pub enum MediaDescriptor {
    File(FileMedia),
    Image(ImageMedia),
    /// Any media kind without a backing resource to prepare (contacts, locations, polls)
    Unsupported { kind: String },
}

impl MediaDescriptor {
    pub fn kind(&self) -> &str {
        match self {
            MediaDescriptor::File(_) => "file",
            MediaDescriptor::Image(_) => "image",
            MediaDescriptor::Unsupported { kind } => kind,
        }
    }

    pub fn as_file(&self) -> Option<&FileMedia> {
        match self {
            MediaDescriptor::File(file) => Some(file),
            _ => None,
        }
    }
}

impl From<FileMedia> for MediaDescriptor {
    fn from(file: FileMedia) -> Self {
        MediaDescriptor::File(file)
    }
}

impl From<ImageMedia> for MediaDescriptor {
    fn from(image: ImageMedia) -> Self {
        MediaDescriptor::Image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THUMBNAIL_BOX: PixelDimensions = PixelDimensions::new(90, 90);

    #[test]
    fn test_fitted_landscape() {
        let fitted = PixelDimensions::new(200, 100).fitted(THUMBNAIL_BOX);
        assert_eq!(fitted, PixelDimensions::new(90, 45));
    }

    #[test]
    fn test_fitted_portrait() {
        let fitted = PixelDimensions::new(300, 1000).fitted(THUMBNAIL_BOX);
        assert_eq!(fitted, PixelDimensions::new(27, 90));
    }

    #[test]
    fn test_fitted_never_upscales() {
        let fitted = PixelDimensions::new(40, 20).fitted(THUMBNAIL_BOX);
        assert_eq!(fitted, PixelDimensions::new(40, 20));
    }

    #[test]
    fn test_fitted_extreme_aspect_keeps_one_pixel() {
        let fitted = PixelDimensions::new(10_000, 3).fitted(THUMBNAIL_BOX);
        assert_eq!(fitted, PixelDimensions::new(90, 1));
        assert!(fitted.fits_within(THUMBNAIL_BOX));
    }

    #[test]
    fn test_replace_image_size_removes_existing() {
        let attributes = vec![
            MediaAttribute::FileName("photo.jpg".to_string()),
            MediaAttribute::ImageSize(PixelDimensions::new(1, 1)),
            MediaAttribute::Animated,
            MediaAttribute::ImageSize(PixelDimensions::new(2, 2)),
        ];

        let updated = replace_image_size(&attributes, PixelDimensions::new(640, 480));

        let sizes: Vec<_> = updated.iter().filter_map(MediaAttribute::image_size).collect();
        assert_eq!(sizes, vec![PixelDimensions::new(640, 480)]);
        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0], MediaAttribute::FileName("photo.jpg".to_string()));
        assert_eq!(
            updated.last(),
            Some(&MediaAttribute::ImageSize(PixelDimensions::new(640, 480)))
        );
        // input untouched
        assert_eq!(attributes.len(), 4);
    }

    #[test]
    fn test_largest_representation() {
        let image = ImageMedia::new(vec![
            ImageRepresentation::new(PixelDimensions::new(90, 90), ResourceId::new("s")),
            ImageRepresentation::new(PixelDimensions::new(1280, 720), ResourceId::new("y")),
            ImageRepresentation::new(PixelDimensions::new(320, 320), ResourceId::new("m")),
        ]);

        let largest = image.largest_representation().unwrap();
        assert_eq!(largest.resource, ResourceId::new("y"));
    }

    #[test]
    fn test_largest_representation_tie_keeps_first() {
        let image = ImageMedia::new(vec![
            ImageRepresentation::new(PixelDimensions::new(100, 50), ResourceId::new("a")),
            ImageRepresentation::new(PixelDimensions::new(50, 100), ResourceId::new("b")),
        ]);

        assert_eq!(
            image.largest_representation().unwrap().resource,
            ResourceId::new("a")
        );
        assert!(ImageMedia::new(vec![]).largest_representation().is_none());
    }

    #[test]
    fn test_file_updates_are_copies() {
        let file = FileMedia::new(ResourceId::new("doc:1"), "application/pdf");
        let updated = file.with_updated_size(4096);

        assert_eq!(file.size, 0);
        assert_eq!(updated.size, 4096);
        assert_eq!(updated.mime_type, "application/pdf");
        assert!(!updated.is_image());
    }

    #[test]
    fn test_descriptor_serialization() {
        let media = MediaDescriptor::File(FileMedia {
            resource: ResourceId::new("doc:7"),
            mime_type: "image/png".to_string(),
            size: 12,
            attributes: vec![MediaAttribute::ImageSize(PixelDimensions::new(3, 4))],
            preview_representations: vec![],
        });

        let json = serde_json::to_string(&media).unwrap();
        let deserialized: MediaDescriptor = serde_json::from_str(&json).unwrap();

        assert_eq!(media, deserialized);
        assert_eq!(deserialized.kind(), "file");
    }
}
