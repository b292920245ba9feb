//! Default values shared across crates

/// Side of the square box outgoing thumbnails are fitted into.
pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 90;

/// Lossy quality factor for thumbnail encoding, on a 0–1 scale.
pub const DEFAULT_THUMBNAIL_QUALITY: f32 = 0.6;

/// Prefix of identifiers allocated for locally generated resources.
pub const LOCAL_RESOURCE_PREFIX: &str = "local-file";

/// Mime type prefix that routes a file through the thumbnail path.
pub const IMAGE_MIME_PREFIX: &str = "image/";

pub const DEFAULT_LOG_FILTER: &str = "mediaprep=debug";
