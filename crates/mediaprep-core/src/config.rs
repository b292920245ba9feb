//! Configuration module
//!
//! Settings for outbound media preparation, read from the environment (and a `.env`
//! file when present).

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_THUMBNAIL_MAX_DIMENSION, DEFAULT_THUMBNAIL_QUALITY};
use crate::models::PixelDimensions;

#[derive(Clone, Debug, PartialEq)]
pub struct TransformConfig {
    /// Side of the square box thumbnails are fitted into
    pub thumbnail_max_dimension: u32,
    /// Lossy quality factor on a 0–1 scale
    pub thumbnail_quality: f32,
    /// Rotate/flip decoded images per their EXIF orientation tag before measuring
    pub respect_exif_orientation: bool,
    pub local_store_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            thumbnail_max_dimension: DEFAULT_THUMBNAIL_MAX_DIMENSION,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            respect_exif_orientation: true,
            local_store_path: None,
            log_filter: None,
        }
    }
}

impl TransformConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self::from_vars(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build a config from an arbitrary variable lookup. Unparseable values fall back
    /// to their defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let thumbnail_max_dimension = lookup("MEDIAPREP_THUMBNAIL_MAX_DIMENSION")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_THUMBNAIL_MAX_DIMENSION);

        let thumbnail_quality = lookup("MEDIAPREP_THUMBNAIL_QUALITY")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .unwrap_or(DEFAULT_THUMBNAIL_QUALITY);

        let respect_exif_orientation = lookup("MEDIAPREP_RESPECT_EXIF_ORIENTATION")
            .map(|v| v.trim().to_lowercase())
            .map(|v| !matches!(v.as_str(), "false" | "0" | "no" | "off"))
            .unwrap_or(true);

        let local_store_path = lookup("MEDIAPREP_LOCAL_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let log_filter = lookup("MEDIAPREP_LOG_FILTER").filter(|v| !v.trim().is_empty());

        TransformConfig {
            thumbnail_max_dimension,
            thumbnail_quality,
            respect_exif_orientation,
            local_store_path,
            log_filter,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.thumbnail_max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "MEDIAPREP_THUMBNAIL_MAX_DIMENSION must be greater than zero"
            ));
        }

        if !(self.thumbnail_quality > 0.0 && self.thumbnail_quality <= 1.0) {
            return Err(anyhow::anyhow!(
                "MEDIAPREP_THUMBNAIL_QUALITY must be in (0, 1], got {}",
                self.thumbnail_quality
            ));
        }

        Ok(())
    }

    pub fn thumbnail_bounds(&self) -> PixelDimensions {
        PixelDimensions::new(self.thumbnail_max_dimension, self.thumbnail_max_dimension)
    }

    /// Quality mapped onto the 1–100 scale JPEG encoders take
    pub fn jpeg_quality(&self) -> u8 {
        (self.thumbnail_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}
