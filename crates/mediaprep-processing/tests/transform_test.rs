mod helpers;

use helpers::{image_file, image_size_count, jpeg_bytes, transformer, write_fixture};
use image::GenericImageView;
use mediaprep_core::{
    ExecutionContext, FileMedia, ImageMedia, ImageRepresentation, MediaAttribute, MediaDescriptor,
    PixelDimensions, ResourceId, ResourceSnapshot, TransformConfig, TransformMode,
    TransformOutcome,
};
use mediaprep_processing::MediaMetadataTransformer;
use mediaprep_storage::test_helpers::MockResourceStore;
use mediaprep_storage::{LocalResourceStore, ResourceStore};
use std::sync::Arc;
use tempfile::TempDir;

fn updated_file(outcome: &TransformOutcome) -> &FileMedia {
    outcome
        .updated()
        .and_then(MediaDescriptor::as_file)
        .expect("expected an updated file")
}

#[tokio::test]
async fn test_image_file_gets_size_and_thumbnail() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "landscape.jpg", &jpeg_bytes(200, 100));

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:landscape");
    store.script(
        &id,
        vec![
            ResourceSnapshot::incomplete(0),
            ResourceSnapshot::complete(&path, len),
        ],
    );

    let outcome = transformer(&store)
        .transform(
            &image_file(&id, vec![MediaAttribute::FileName("landscape.jpg".to_string())]),
            TransformMode::WaitForCompletion,
            ExecutionContext::Blocking,
        )
        .await;

    let file = updated_file(&outcome);
    assert_eq!(file.size, len);
    assert_eq!(file.image_size(), Some(PixelDimensions::new(200, 100)));
    assert_eq!(image_size_count(file), 1);
    assert!(file
        .attributes
        .contains(&MediaAttribute::FileName("landscape.jpg".to_string())));

    assert_eq!(file.preview_representations.len(), 1);
    let preview = &file.preview_representations[0];
    assert_eq!(preview.dimensions, PixelDimensions::new(90, 45));
    assert!(preview.resource.is_local());

    let stored = store.stored(&preview.resource).expect("thumbnail stored");
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!(decoded.dimensions(), (90, 45));
}

#[tokio::test]
async fn test_existing_image_size_replaced() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "portrait.jpg", &jpeg_bytes(300, 1000));

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:portrait");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let stale = vec![
        MediaAttribute::ImageSize(PixelDimensions::new(10, 10)),
        MediaAttribute::ImageSize(PixelDimensions::new(20, 20)),
    ];
    let outcome = transformer(&store)
        .transform(
            &image_file(&id, stale),
            TransformMode::Opportunistic,
            ExecutionContext::Inline,
        )
        .await;

    let file = updated_file(&outcome);
    assert_eq!(image_size_count(file), 1);
    assert_eq!(file.image_size(), Some(PixelDimensions::new(300, 1000)));
    assert_eq!(
        file.preview_representations[0].dimensions,
        PixelDimensions::new(27, 90)
    );
}

#[tokio::test]
async fn test_audio_file_gets_size_only() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "clip.ogg", &[7u8; 8000]);

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:clip");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let audio = MediaAttribute::Audio {
        duration_secs: 3,
        title: None,
        performer: None,
        voice: true,
    };
    let media = MediaDescriptor::File(
        FileMedia::new(id.clone(), "audio/ogg").with_updated_attributes(vec![audio.clone()]),
    );

    let outcome = transformer(&store)
        .transform(
            &media,
            TransformMode::WaitForCompletion,
            ExecutionContext::Blocking,
        )
        .await;

    let file = updated_file(&outcome);
    assert_eq!(file.size, 8000);
    assert_eq!(file.attributes, vec![audio]);
    assert!(file.preview_representations.is_empty());
    assert!(store.stored_ids().is_empty());
}

#[tokio::test]
async fn test_photo_is_never_updated() {
    let store = MockResourceStore::new();
    let id = ResourceId::new("photo:1");
    store.script(&id, vec![ResourceSnapshot::complete("/tmp/photo1", 4096)]);

    let media = MediaDescriptor::Image(ImageMedia::new(vec![ImageRepresentation::new(
        PixelDimensions::new(800, 600),
        id.clone(),
    )]));

    for mode in [TransformMode::Opportunistic, TransformMode::WaitForCompletion] {
        let outcome = transformer(&store)
            .transform(&media, mode, ExecutionContext::for_mode(mode))
            .await;
        assert_eq!(outcome, TransformOutcome::Unavailable);
    }

    assert_eq!(store.fetch_count(&id), 2);
    assert!(store.all_fetches_cancelled(&id));
}

#[tokio::test]
async fn test_opportunistic_consumes_exactly_one_snapshot() {
    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:slow");
    store.script(
        &id,
        vec![
            ResourceSnapshot::partial("/tmp/slow.part", 100),
            ResourceSnapshot::partial("/tmp/slow.part", 200),
            ResourceSnapshot::complete("/tmp/slow", 300),
        ],
    );

    let outcome = transformer(&store)
        .transform(
            &image_file(&id, Vec::new()),
            TransformMode::Opportunistic,
            ExecutionContext::Inline,
        )
        .await;

    assert_eq!(outcome, TransformOutcome::Unavailable);
    assert_eq!(store.emitted_count(&id), 1);
    assert!(store.all_fetches_cancelled(&id));
    assert_eq!(store.live_observers(), 0);
}

#[tokio::test]
async fn test_transform_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "square.jpg", &jpeg_bytes(180, 180));

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:square");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let transformer = transformer(&store);
    let first = transformer
        .transform(
            &image_file(&id, Vec::new()),
            TransformMode::WaitForCompletion,
            ExecutionContext::Blocking,
        )
        .await
        .into_media()
        .unwrap();
    let second = transformer
        .transform(
            &first,
            TransformMode::WaitForCompletion,
            ExecutionContext::Blocking,
        )
        .await;

    let first = first.as_file().unwrap();
    let second = updated_file(&second);
    assert_eq!(first.size, second.size);
    assert_eq!(first.attributes, second.attributes);
    assert_eq!(image_size_count(second), 1);
    assert_eq!(
        first.preview_representations[0].dimensions,
        second.preview_representations[0].dimensions
    );
    assert_eq!(second.preview_representations.len(), 1);
}

#[tokio::test]
async fn test_undecodable_image_keeps_size_update() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "broken.jpg", b"\xFF\xD8 truncated");

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:broken");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let outcome = transformer(&store)
        .transform(
            &image_file(&id, Vec::new()),
            TransformMode::Opportunistic,
            ExecutionContext::Inline,
        )
        .await;

    let file = updated_file(&outcome);
    assert_eq!(file.size, len);
    assert_eq!(image_size_count(file), 0);
    assert!(file.preview_representations.is_empty());
    assert!(store.stored_ids().is_empty());
}

#[tokio::test]
async fn test_thumbnail_write_failure_still_updates() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "wide.jpg", &jpeg_bytes(400, 100));

    let store = MockResourceStore::new();
    store.fail_writes(true);
    let id = ResourceId::new("upload:wide");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let outcome = transformer(&store)
        .transform(
            &image_file(&id, Vec::new()),
            TransformMode::WaitForCompletion,
            ExecutionContext::Blocking,
        )
        .await;

    let file = updated_file(&outcome);
    assert_eq!(file.image_size(), Some(PixelDimensions::new(400, 100)));
    assert_eq!(
        file.preview_representations[0].dimensions,
        PixelDimensions::new(90, 22)
    );
    assert!(store.stored_ids().is_empty());
}

#[tokio::test]
async fn test_execution_contexts_agree() {
    let dir = TempDir::new().unwrap();
    let (path, len) = write_fixture(dir.path(), "ctx.jpg", &jpeg_bytes(120, 60));

    let store = MockResourceStore::new();
    let id = ResourceId::new("upload:ctx");
    store.script(&id, vec![ResourceSnapshot::complete(&path, len)]);

    let transformer = transformer(&store);
    let media = image_file(&id, Vec::new());
    let inline = transformer
        .transform(&media, TransformMode::Opportunistic, ExecutionContext::Inline)
        .await;
    let blocking = transformer
        .transform(&media, TransformMode::Opportunistic, ExecutionContext::Blocking)
        .await;

    let inline = updated_file(&inline);
    let blocking = updated_file(&blocking);
    assert_eq!(inline.attributes, blocking.attributes);
    assert_eq!(
        inline.preview_representations[0].dimensions,
        blocking.preview_representations[0].dimensions
    );
}

#[tokio::test]
async fn test_local_store_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LocalResourceStore::new(dir.path()).await.unwrap());
    let source = ResourceId::new("upload:local");

    let transformer = MediaMetadataTransformer::new(store.clone(), &TransformConfig::default());
    let media = image_file(&source, Vec::new());

    let task = {
        let transformer = transformer.clone();
        let media = media.clone();
        tokio::spawn(async move {
            transformer
                .transform(
                    &media,
                    TransformMode::WaitForCompletion,
                    ExecutionContext::Blocking,
                )
                .await
        })
    };

    let data = jpeg_bytes(160, 90);
    store
        .store_data(&source, bytes::Bytes::from(data.clone()))
        .await
        .unwrap();

    let outcome = task.await.unwrap();
    let file = updated_file(&outcome);
    assert_eq!(file.size, data.len() as u64);
    assert_eq!(file.image_size(), Some(PixelDimensions::new(160, 90)));

    let preview = &file.preview_representations[0];
    assert_eq!(preview.dimensions, PixelDimensions::new(90, 50));
    let thumbnail = store.read(&preview.resource).await.unwrap();
    assert_eq!(
        image::load_from_memory(&thumbnail).unwrap().dimensions(),
        (90, 50)
    );
}
