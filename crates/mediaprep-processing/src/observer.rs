//! Resource availability observation
//!
//! Joins "trigger a fetch" and "watch the locally available bytes" into a single
//! subscription that terminates on the first complete snapshot or on cancellation.

use async_stream::stream;
use futures::{Stream, StreamExt};
use mediaprep_core::{FetchParameters, ResourceDataOption, ResourceId, ResourceSnapshot};
use mediaprep_storage::{FetchHandle, ResourceStore, SnapshotStream};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Cancels the fetch it wraps when dropped
struct FetchGuard(FetchHandle);

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Cancels a [`ResourceSubscription`] from anywhere. Idempotent.
#[derive(Debug, Clone)]
pub struct SubscriptionCanceller {
    token: CancellationToken,
    fetch: FetchHandle,
}

impl SubscriptionCanceller {
    pub fn cancel(&self) {
        self.token.cancel();
        self.fetch.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Live subscription to one resource's availability
///
/// Yields every snapshot the store produces, unmodified, and ends right after the
/// first complete one. Dropping the subscription cancels it.
pub struct ResourceSubscription {
    resource_id: ResourceId,
    snapshots: SnapshotStream,
    canceller: SubscriptionCanceller,
}

impl ResourceSubscription {
    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    /// Next snapshot, or `None` once the subscription has terminated
    pub async fn next(&mut self) -> Option<ResourceSnapshot> {
        self.snapshots.next().await
    }

    /// Stop both the fetch trigger and the data stream
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.canceller.is_cancelled()
    }

    pub fn canceller(&self) -> SubscriptionCanceller {
        self.canceller.clone()
    }
}

impl Stream for ResourceSubscription {
    type Item = ResourceSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.snapshots.as_mut().poll_next(cx)
    }
}

impl Drop for ResourceSubscription {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

/// Subscribes to resource availability through a [`ResourceStore`]
#[derive(Clone)]
pub struct ResourceAvailabilityObserver {
    store: Arc<dyn ResourceStore>,
    fetch_parameters: FetchParameters,
}

impl ResourceAvailabilityObserver {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        ResourceAvailabilityObserver {
            store,
            fetch_parameters: FetchParameters::default(),
        }
    }

    pub fn with_fetch_parameters(mut self, fetch_parameters: FetchParameters) -> Self {
        self.fetch_parameters = fetch_parameters;
        self
    }

    /// Start fetching `resource_id` and watch its data until complete.
    pub fn subscribe(&self, resource_id: &ResourceId) -> ResourceSubscription {
        let token = CancellationToken::new();
        let fetch = self.store.fetch(resource_id, self.fetch_parameters);
        let data = self.store.observe_data(
            resource_id,
            ResourceDataOption {
                wait_until_fetch_attempted: true,
            },
        );

        tracing::debug!(resource_id = %resource_id, "Resource subscription started");

        let snapshots = until_complete(resource_id.clone(), data, fetch.clone(), token.clone());

        ResourceSubscription {
            resource_id: resource_id.clone(),
            snapshots,
            canceller: SubscriptionCanceller { token, fetch },
        }
    }
}

fn until_complete(
    resource_id: ResourceId,
    mut data: SnapshotStream,
    fetch: FetchHandle,
    token: CancellationToken,
) -> SnapshotStream {
    Box::pin(stream! {
        let _fetch = FetchGuard(fetch);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(resource_id = %resource_id, "Resource subscription cancelled");
                    break;
                }
                next = data.next() => next,
            };

            let Some(snapshot) = next else {
                tracing::debug!(resource_id = %resource_id, "Resource data stream ended");
                break;
            };

            let complete = snapshot.complete;
            yield snapshot;

            if complete {
                tracing::debug!(resource_id = %resource_id, "Resource complete");
                break;
            }
        }
    })
}
