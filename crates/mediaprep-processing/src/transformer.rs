//! Media metadata transformer
//!
//! Brings an outgoing media descriptor in line with its locally available resource:
//! files get their final size and, for images, a fresh thumbnail and `ImageSize`.
//!
//! ```text
//! transform(media, mode, context)
//!   File  -> subscribe(resource) -> snapshot -> size-only | thumbnail -> Updated
//!   Image -> subscribe(largest representation) -> snapshot -> Unavailable
//!   other -> Unavailable
//! ```
//!
//! Photos never come back updated. Only the fetch side effect of observing their
//! largest representation is kept.

use crate::observer::ResourceAvailabilityObserver;
use mediaprep_core::{
    replace_image_size, ExecutionContext, FileMedia, ImageMedia, ImageRepresentation, LogLevel,
    MediaDescriptor, MediaError, ResourceId, ResourceSnapshot, TransformConfig, TransformMode,
    TransformOutcome,
};
use mediaprep_storage::ResourceStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "image")]
use crate::image::{Thumbnail, ThumbnailGenerator};

/// What the subscription produced for the current mode
enum Selection {
    Snapshot(ResourceSnapshot),
    Ended,
    Cancelled,
}

#[derive(Clone)]
pub struct MediaMetadataTransformer {
    store: Arc<dyn ResourceStore>,
    observer: ResourceAvailabilityObserver,
    #[cfg(feature = "image")]
    thumbnails: ThumbnailGenerator,
}

impl MediaMetadataTransformer {
    #[cfg_attr(not(feature = "image"), allow(unused_variables))]
    pub fn new(store: Arc<dyn ResourceStore>, config: &TransformConfig) -> Self {
        MediaMetadataTransformer {
            observer: ResourceAvailabilityObserver::new(Arc::clone(&store)),
            store,
            #[cfg(feature = "image")]
            thumbnails: ThumbnailGenerator::new(config),
        }
    }

    pub fn with_observer(mut self, observer: ResourceAvailabilityObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Produce an updated descriptor for `media`.
    ///
    /// Dropping the returned future cancels the underlying subscription. In
    /// `WaitForCompletion` mode this can wait forever if the store never completes the
    /// resource; bound it at the call site or use [`Self::transform_with_cancellation`].
    pub async fn transform(
        &self,
        media: &MediaDescriptor,
        mode: TransformMode,
        context: ExecutionContext,
    ) -> TransformOutcome {
        self.transform_with_cancellation(media, mode, context, CancellationToken::new())
            .await
    }

    /// [`Self::transform`] that stops waiting for the resource once `cancel` fires.
    ///
    /// Cancellation only reaches the subscription: it yields `NotYetComplete` while
    /// snapshots are still being awaited. Once a complete snapshot is in hand, the
    /// thumbnail is derived and stored regardless.
    pub async fn transform_with_cancellation(
        &self,
        media: &MediaDescriptor,
        mode: TransformMode,
        context: ExecutionContext,
        cancel: CancellationToken,
    ) -> TransformOutcome {
        match media {
            MediaDescriptor::File(file) => self.transform_file(file, mode, context, &cancel).await,
            MediaDescriptor::Image(image) => self.transform_image(image, mode, &cancel).await,
            MediaDescriptor::Unsupported { kind } => {
                tracing::debug!(kind = %kind, "No resource to prepare for media kind");
                TransformOutcome::Unavailable
            }
        }
    }

    async fn transform_file(
        &self,
        file: &FileMedia,
        mode: TransformMode,
        context: ExecutionContext,
        cancel: &CancellationToken,
    ) -> TransformOutcome {
        let snapshot = match self.select_snapshot(&file.resource, mode, cancel).await {
            Selection::Snapshot(snapshot) => snapshot,
            Selection::Ended => return TransformOutcome::Unavailable,
            Selection::Cancelled => return TransformOutcome::NotYetComplete,
        };

        if !snapshot.complete {
            tracing::debug!(
                resource_id = %file.resource,
                size = snapshot.size,
                "Resource not fully available yet"
            );
            return TransformOutcome::Unavailable;
        }

        let sized = file.with_updated_size(snapshot.size);
        if !file.is_image() {
            return TransformOutcome::Updated(MediaDescriptor::File(sized));
        }

        match self.derive_thumbnail(&snapshot, context).await {
            Ok(thumbnail) => {
                let updated = self.attach_thumbnail(&sized, thumbnail).await;
                TransformOutcome::Updated(MediaDescriptor::File(updated))
            }
            Err(e) => {
                log_derivation_failure(&file.resource, &e);
                TransformOutcome::Updated(MediaDescriptor::File(sized))
            }
        }
    }

    async fn transform_image(
        &self,
        image: &ImageMedia,
        mode: TransformMode,
        cancel: &CancellationToken,
    ) -> TransformOutcome {
        let Some(representation) = image.largest_representation() else {
            tracing::debug!("Image media has no representations");
            return TransformOutcome::Unavailable;
        };

        let selection = self
            .select_snapshot(&representation.resource, mode, cancel)
            .await;
        if let Selection::Cancelled = selection {
            return TransformOutcome::NotYetComplete;
        }

        tracing::debug!(
            resource_id = %representation.resource,
            complete = matches!(&selection, Selection::Snapshot(s) if s.complete),
            "Image media left unchanged"
        );

        TransformOutcome::Unavailable
    }

    /// Consume snapshots per `mode` and cancel the subscription afterwards.
    ///
    /// Opportunistic takes the first snapshot whatever its state; WaitForCompletion
    /// scans until the first complete one.
    async fn select_snapshot(
        &self,
        resource: &ResourceId,
        mode: TransformMode,
        cancel: &CancellationToken,
    ) -> Selection {
        let mut subscription = self.observer.subscribe(resource);

        let consume = async {
            match mode {
                TransformMode::Opportunistic => subscription.next().await,
                TransformMode::WaitForCompletion => {
                    while let Some(snapshot) = subscription.next().await {
                        if snapshot.complete {
                            return Some(snapshot);
                        }
                    }
                    None
                }
            }
        };

        let selection = tokio::select! {
            biased;
            _ = cancel.cancelled() => Selection::Cancelled,
            selected = consume => match selected {
                Some(snapshot) => Selection::Snapshot(snapshot),
                None => Selection::Ended,
            },
        };

        subscription.cancel();

        match &selection {
            Selection::Snapshot(_) => {}
            Selection::Ended => tracing::debug!(
                resource_id = %resource,
                mode = %mode,
                "Resource stream ended without a usable snapshot"
            ),
            Selection::Cancelled => tracing::debug!(
                resource_id = %resource,
                mode = %mode,
                "Transform cancelled before the resource was usable"
            ),
        }

        selection
    }

    #[cfg(feature = "image")]
    async fn derive_thumbnail(
        &self,
        snapshot: &ResourceSnapshot,
        context: ExecutionContext,
    ) -> Result<Thumbnail, MediaError> {
        let path = snapshot
            .path()
            .ok_or_else(|| MediaError::MissingData("complete snapshot has no path".to_string()))?
            .to_path_buf();
        let generator = self.thumbnails;

        match context {
            ExecutionContext::Inline => {
                let data = tokio::fs::read(&path).await?;
                generator.generate(&data)
            }
            ExecutionContext::Blocking => {
                tokio::task::spawn_blocking(move || generator.generate_from_path(&path))
                    .await
                    .map_err(|e| MediaError::Task(e.to_string()))?
            }
        }
    }

    #[cfg(not(feature = "image"))]
    async fn derive_thumbnail(
        &self,
        _snapshot: &ResourceSnapshot,
        _context: ExecutionContext,
    ) -> Result<Thumbnail, MediaError> {
        Err(MediaError::InvalidInput(
            "image support is not compiled in".to_string(),
        ))
    }

    /// Store the thumbnail under a fresh id and describe it on `file`.
    ///
    /// The write is not verified: a failed write is logged and the descriptor still
    /// references the new id.
    async fn attach_thumbnail(&self, file: &FileMedia, thumbnail: Thumbnail) -> FileMedia {
        let thumbnail_id = ResourceId::generate_local();

        if let Err(e) = self.store.store_data(&thumbnail_id, thumbnail.data).await {
            tracing::warn!(
                resource_id = %file.resource,
                thumbnail_id = %thumbnail_id,
                error = %e,
                "Failed to store thumbnail"
            );
        }

        tracing::info!(
            resource_id = %file.resource,
            thumbnail_id = %thumbnail_id,
            width = thumbnail.source_dimensions.width,
            height = thumbnail.source_dimensions.height,
            size = file.size,
            "Image file prepared"
        );

        file.with_updated_attributes(replace_image_size(
            &file.attributes,
            thumbnail.source_dimensions,
        ))
        .with_updated_preview_representations(vec![ImageRepresentation::new(
            thumbnail.dimensions,
            thumbnail_id,
        )])
    }
}

#[cfg(not(feature = "image"))]
struct Thumbnail {
    source_dimensions: mediaprep_core::PixelDimensions,
    dimensions: mediaprep_core::PixelDimensions,
    data: bytes::Bytes,
}

fn log_derivation_failure(resource: &ResourceId, error: &MediaError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            resource_id = %resource,
            error = %error,
            "Thumbnail skipped, keeping size-only update"
        ),
        LogLevel::Warn => tracing::warn!(
            resource_id = %resource,
            error = %error,
            "Thumbnail failed, keeping size-only update"
        ),
        LogLevel::Error => tracing::error!(
            resource_id = %resource,
            error = %error,
            code = error.error_code(),
            "Thumbnail failed, keeping size-only update"
        ),
    }
}
