#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use mediaprep_core::{FileMedia, MediaAttribute, MediaDescriptor, ResourceId, TransformConfig};
use mediaprep_processing::MediaMetadataTransformer;
use mediaprep_storage::test_helpers::MockResourceStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 80]));
    let mut buffer = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 85))
        .unwrap();
    buffer
}

/// Write `data` under `dir` and return its path and length
pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> (PathBuf, u64) {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    (path, data.len() as u64)
}

pub fn transformer(store: &MockResourceStore) -> MediaMetadataTransformer {
    MediaMetadataTransformer::new(Arc::new(store.clone()), &TransformConfig::default())
}

pub fn image_file(id: &ResourceId, attributes: Vec<MediaAttribute>) -> MediaDescriptor {
    MediaDescriptor::File(FileMedia::new(id.clone(), "image/jpeg").with_updated_attributes(attributes))
}

pub fn image_size_count(file: &FileMedia) -> usize {
    file.attributes
        .iter()
        .filter(|attribute| attribute.image_size().is_some())
        .count()
}
