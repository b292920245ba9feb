use crate::keys::{partial_file_name, resource_file_name};
use crate::traits::{FetchHandle, ResourceStore, SnapshotStream, StoreError, StoreResult};
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use mediaprep_core::{
    FetchParameters, ResourceDataOption, ResourceId, ResourceSnapshot, TransformConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
struct ResourceState {
    snapshot: ResourceSnapshot,
    fetch_attempted: bool,
}

impl ResourceState {
    /// State derived from the lengths of the complete and partial files, if present
    fn from_disk(complete: (PathBuf, Option<u64>), partial: (PathBuf, Option<u64>)) -> Self {
        let snapshot = match (complete, partial) {
            ((path, Some(len)), _) => ResourceSnapshot::complete(path, len),
            (_, (path, Some(len))) => ResourceSnapshot::partial(path, len),
            _ => ResourceSnapshot::incomplete(0),
        };

        ResourceState {
            snapshot,
            fetch_attempted: false,
        }
    }

    /// Nothing here that a fresh read of the disk would not give back
    fn is_recoverable(&self) -> bool {
        self.snapshot.complete || !self.fetch_attempted
    }
}

type Channels = Arc<Mutex<HashMap<ResourceId, watch::Sender<ResourceState>>>>;

fn lock(channels: &Channels) -> MutexGuard<'_, HashMap<ResourceId, watch::Sender<ResourceState>>> {
    channels.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A receiver on one resource channel
///
/// Dropping the last observation of a resource stops tracking it.
struct Observation {
    receiver: watch::Receiver<ResourceState>,
    channels: Channels,
    id: ResourceId,
}

impl Drop for Observation {
    fn drop(&mut self) {
        let mut channels = lock(&self.channels);
        // self.receiver is still counted here
        let last = channels
            .get(&self.id)
            .is_some_and(|sender| sender.receiver_count() <= 1);
        if last {
            channels.remove(&self.id);
        }
    }
}

/// Local filesystem resource store
///
/// There is no remote behind this store: a fetch only records the attempt, and data
/// arrives through [`store_data`](ResourceStore::store_data) or the partial-write
/// methods. Observers are notified through one watch channel per resource, kept only
/// while the resource is observed or has a fetch in flight.
#[derive(Clone)]
pub struct LocalResourceStore {
    base_path: PathBuf,
    channels: Channels,
}

impl LocalResourceStore {
    /// Create a new LocalResourceStore rooted at `base_path` (created if missing)
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalResourceStore {
            base_path,
            channels: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create a store at `MEDIAPREP_LOCAL_STORE_PATH`
    pub async fn from_config(config: &TransformConfig) -> StoreResult<Self> {
        let base_path = config.local_store_path.clone().ok_or_else(|| {
            StoreError::ConfigError("MEDIAPREP_LOCAL_STORE_PATH is not set".to_string())
        })?;

        Self::new(base_path).await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resource_path(&self, id: &ResourceId) -> StoreResult<PathBuf> {
        Ok(self.base_path.join(resource_file_name(id)?))
    }

    fn partial_path(&self, id: &ResourceId) -> StoreResult<PathBuf> {
        Ok(self.base_path.join(partial_file_name(id)?))
    }

    /// Availability of `id` as found on disk
    async fn disk_state(&self, id: &ResourceId) -> StoreResult<ResourceState> {
        let complete = self.resource_path(id)?;
        let partial = self.partial_path(id)?;
        let complete_len = fs::metadata(&complete).await.ok().map(|meta| meta.len());
        let partial_len = fs::metadata(&partial).await.ok().map(|meta| meta.len());

        Ok(ResourceState::from_disk(
            (complete, complete_len),
            (partial, partial_len),
        ))
    }

    /// [`Self::disk_state`] for the synchronous fetch trigger
    fn disk_state_blocking(&self, id: &ResourceId) -> StoreResult<ResourceState> {
        let complete = self.resource_path(id)?;
        let partial = self.partial_path(id)?;
        let complete_len = std::fs::metadata(&complete).ok().map(|meta| meta.len());
        let partial_len = std::fs::metadata(&partial).ok().map(|meta| meta.len());

        Ok(ResourceState::from_disk(
            (complete, complete_len),
            (partial, partial_len),
        ))
    }

    /// Apply `update` to the tracked state of `id`, starting from `initial` if untracked.
    ///
    /// Unobserved resources stay tracked only while their state is not recoverable
    /// from disk.
    fn publish<F>(&self, id: &ResourceId, initial: ResourceState, update: F)
    where
        F: FnOnce(&mut ResourceState),
    {
        let mut channels = lock(&self.channels);

        match channels.get(id) {
            Some(sender) => {
                sender.send_modify(update);
                let idle = sender.receiver_count() == 0 && sender.borrow().is_recoverable();
                if idle {
                    channels.remove(id);
                }
            }
            None => {
                let mut state = initial;
                update(&mut state);
                if !state.is_recoverable() {
                    channels.insert(id.clone(), watch::channel(state).0);
                }
            }
        }
    }

    async fn observe(&self, id: &ResourceId) -> StoreResult<Observation> {
        let initial = self.disk_state(id).await?;

        let mut channels = lock(&self.channels);
        let receiver = channels
            .entry(id.clone())
            .or_insert_with(|| watch::channel(initial).0)
            .subscribe();

        Ok(Observation {
            receiver,
            channels: Arc::clone(&self.channels),
            id: id.clone(),
        })
    }

    /// Current availability of `id`
    pub async fn snapshot(&self, id: &ResourceId) -> StoreResult<ResourceSnapshot> {
        let tracked = lock(&self.channels)
            .get(id)
            .map(|sender| sender.borrow().snapshot.clone());

        match tracked {
            Some(snapshot) => Ok(snapshot),
            None => Ok(self.disk_state(id).await?.snapshot),
        }
    }

    /// Number of resources with live state in memory
    pub fn tracked_resources(&self) -> usize {
        lock(&self.channels).len()
    }

    /// Append bytes to the partial file of `id` and notify observers
    pub async fn append_partial(
        &self,
        id: &ResourceId,
        data: &[u8],
    ) -> StoreResult<ResourceSnapshot> {
        let path = self.partial_path(id)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                StoreError::WriteFailed(format!("Failed to open file {}: {}", path.display(), e))
            })?;

        file.write_all(data).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.flush().await?;

        let size = fs::metadata(&path).await?.len();
        let snapshot = ResourceSnapshot::partial(path, size);
        self.publish(id, ResourceState::default(), |state| {
            state.snapshot = snapshot.clone()
        });

        tracing::debug!(
            resource_id = %id,
            size_bytes = size,
            "Partial resource data appended"
        );

        Ok(snapshot)
    }

    /// Promote the partial file of `id` to complete data
    pub async fn finish_partial(&self, id: &ResourceId) -> StoreResult<ResourceSnapshot> {
        let partial = self.partial_path(id)?;
        let complete = self.resource_path(id)?;

        if !fs::try_exists(&partial).await.unwrap_or(false) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        fs::rename(&partial, &complete).await.map_err(|e| {
            StoreError::BackendError(format!(
                "Failed to rename {} to {}: {}",
                partial.display(),
                complete.display(),
                e
            ))
        })?;

        let size = fs::metadata(&complete).await?.len();
        let snapshot = ResourceSnapshot::complete(complete, size);
        self.publish(id, ResourceState::default(), |state| {
            state.snapshot = snapshot.clone()
        });

        tracing::info!(resource_id = %id, size_bytes = size, "Resource completed");

        Ok(snapshot)
    }

    /// Read the complete data of `id`
    pub async fn read(&self, id: &ResourceId) -> StoreResult<Bytes> {
        let path = self.resource_path(id)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let data = fs::read(&path).await?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl ResourceStore for LocalResourceStore {
    fn fetch(&self, id: &ResourceId, params: FetchParameters) -> FetchHandle {
        tracing::debug!(
            resource_id = %id,
            priority = ?params.priority,
            "Local fetch requested"
        );

        // Looked up before the channel lock is taken
        match self.disk_state_blocking(id) {
            Ok(initial) => self.publish(id, initial, |state| state.fetch_attempted = true),
            Err(e) => {
                tracing::warn!(resource_id = %id, error = %e, "Fetch of unaddressable resource")
            }
        }

        FetchHandle::new()
    }

    fn observe_data(&self, id: &ResourceId, option: ResourceDataOption) -> SnapshotStream {
        if let Err(e) = resource_file_name(id) {
            tracing::warn!(resource_id = %id, error = %e, "Observing unaddressable resource");
            return Box::pin(futures::stream::pending::<ResourceSnapshot>());
        }

        let store = self.clone();
        let id = id.clone();

        Box::pin(stream! {
            let mut observation = match store.observe(&id).await {
                Ok(observation) => observation,
                Err(e) => {
                    tracing::warn!(resource_id = %id, error = %e, "Failed to observe resource");
                    return;
                }
            };

            loop {
                let state = observation.receiver.borrow_and_update().clone();
                let ready = !option.wait_until_fetch_attempted
                    || state.fetch_attempted
                    || state.snapshot.complete;

                if ready {
                    yield state.snapshot;
                }

                if observation.receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn store_data(&self, id: &ResourceId, data: Bytes) -> StoreResult<()> {
        let partial = self.partial_path(id)?;
        let complete = self.resource_path(id)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&partial).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to create file {}: {}", partial.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to write file {}: {}", partial.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to sync file {}: {}", partial.display(), e))
        })?;

        fs::rename(&partial, &complete).await?;

        let snapshot = ResourceSnapshot::complete(complete.clone(), size);
        self.publish(id, ResourceState::default(), |state| state.snapshot = snapshot);

        tracing::info!(
            path = %complete.display(),
            resource_id = %id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store write successful"
        );

        Ok(())
    }
}
