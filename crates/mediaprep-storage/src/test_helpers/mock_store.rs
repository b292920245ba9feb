//! Mock ResourceStore implementation for testing

use crate::traits::{FetchHandle, ResourceStore, SnapshotStream, StoreError, StoreResult};
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use mediaprep_core::{FetchParameters, ResourceDataOption, ResourceId, ResourceSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Script {
    snapshots: Vec<ResourceSnapshot>,
    /// End the stream after the script instead of staying silent forever
    ends: bool,
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<ResourceId, Script>,
    fetches: HashMap<ResourceId, Vec<FetchHandle>>,
    stored: HashMap<ResourceId, Bytes>,
    emitted: HashMap<ResourceId, usize>,
    fail_writes: bool,
}

/// Decrements the live-observer counter when an observation stream is dropped
struct ObserverGuard(Arc<AtomicUsize>);

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resource store that replays scripted snapshots and records every call
#[derive(Clone, Default)]
pub struct MockResourceStore {
    state: Arc<Mutex<MockState>>,
    live_observers: Arc<AtomicUsize>,
}

impl MockResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `snapshots` in order, then stay silent (like a stalled network).
    pub fn script(&self, id: &ResourceId, snapshots: Vec<ResourceSnapshot>) {
        self.state.lock().unwrap().scripts.insert(
            id.clone(),
            Script {
                snapshots,
                ends: false,
            },
        );
    }

    /// Emit `snapshots` in order, then end the stream.
    pub fn script_then_end(&self, id: &ResourceId, snapshots: Vec<ResourceSnapshot>) {
        self.state.lock().unwrap().scripts.insert(
            id.clone(),
            Script {
                snapshots,
                ends: true,
            },
        );
    }

    /// Make every subsequent `store_data` call fail
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn fetch_count(&self, id: &ResourceId) -> usize {
        self.state
            .lock()
            .unwrap()
            .fetches
            .get(id)
            .map_or(0, Vec::len)
    }

    /// True when at least one fetch of `id` was started and all of them were cancelled
    pub fn all_fetches_cancelled(&self, id: &ResourceId) -> bool {
        let state = self.state.lock().unwrap();
        match state.fetches.get(id) {
            Some(handles) if !handles.is_empty() => handles.iter().all(FetchHandle::is_cancelled),
            _ => false,
        }
    }

    /// Number of snapshots delivered to observers of `id`
    pub fn emitted_count(&self, id: &ResourceId) -> usize {
        self.state
            .lock()
            .unwrap()
            .emitted
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Observation streams that have not been dropped yet
    pub fn live_observers(&self) -> usize {
        self.live_observers.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: &ResourceId) -> Option<Bytes> {
        self.state.lock().unwrap().stored.get(id).cloned()
    }

    pub fn stored_ids(&self) -> Vec<ResourceId> {
        self.state.lock().unwrap().stored.keys().cloned().collect()
    }
}

#[async_trait]
impl ResourceStore for MockResourceStore {
    fn fetch(&self, id: &ResourceId, _params: FetchParameters) -> FetchHandle {
        let handle = FetchHandle::new();
        self.state
            .lock()
            .unwrap()
            .fetches
            .entry(id.clone())
            .or_default()
            .push(handle.clone());
        handle
    }

    fn observe_data(&self, id: &ResourceId, _option: ResourceDataOption) -> SnapshotStream {
        let script = self
            .state
            .lock()
            .unwrap()
            .scripts
            .get(id)
            .cloned()
            .unwrap_or(Script {
                snapshots: Vec::new(),
                ends: false,
            });

        self.live_observers.fetch_add(1, Ordering::SeqCst);
        let guard = ObserverGuard(Arc::clone(&self.live_observers));
        let state = Arc::clone(&self.state);
        let id = id.clone();

        Box::pin(stream! {
            let _guard = guard;
            for snapshot in script.snapshots {
                *state.lock().unwrap().emitted.entry(id.clone()).or_default() += 1;
                yield snapshot;
            }
            if !script.ends {
                futures::future::pending::<()>().await;
            }
        })
    }

    async fn store_data(&self, id: &ResourceId, data: Bytes) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(StoreError::WriteFailed(format!("injected failure for {}", id)));
        }
        state.stored.insert(id.clone(), data);
        Ok(())
    }
}
