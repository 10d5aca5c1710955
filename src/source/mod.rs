//! Collaborators that feed a layout session.
//!
//! This module provides the two producer-side interfaces:
//! - `DataSource`: pages of item records
//! - `AssetLoader`: natural sizes for assets, run off the session thread
//!
//! plus manifest-backed implementations of both and a worker that runs a
//! data source off the UI thread.

use crate::model::{AssetRef, FetchError, ItemRecord, LoadOutcome};
use crate::pagination::FetchRequest;
use crate::session::{CompletionSender, LoadRequest};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub mod assets;
pub mod fetcher;
pub mod manifest;

pub use assets::{AssetSpec, ManifestAssetLoader};
pub use fetcher::{PageFetcher, PageResponse};
pub use manifest::{ManifestEntry, ManifestSource};

/// Supplier of item batches, one page per request.
///
/// An empty page means there is nothing more to fetch.
pub trait DataSource: Send {
    /// # Errors
    ///
    /// Returns `FetchError` if the page cannot be produced. The session
    /// treats this as advisory and re-requests the same page later.
    fn fetch_page(&mut self, request: &FetchRequest) -> Result<Vec<ItemRecord>, FetchError>;
}

/// Resolves an asset to its natural size (or a failure).
pub trait AssetLoader: Send + Sync {
    /// Natural size of `asset`, or why it has none.
    fn load(&self, asset: &AssetRef) -> LoadOutcome;

    /// Simulated or expected time before `load` completes.
    fn latency(&self, _asset: &AssetRef) -> Duration {
        Duration::ZERO
    }
}

/// Run each load on its own worker thread and report through `sender`.
///
/// Each worker waits out the loader's latency for its asset first, so
/// completions arrive in latency order rather than sequence order.
/// Results for a torn-down session are dropped.
pub fn spawn_loads(
    loader: Arc<dyn AssetLoader>,
    requests: Vec<LoadRequest>,
    sender: CompletionSender,
) -> Vec<JoinHandle<()>> {
    requests
        .into_iter()
        .map(|request| {
            let loader = Arc::clone(&loader);
            let sender = sender.clone();
            thread::spawn(move || {
                let latency = loader.latency(&request.asset);
                if !latency.is_zero() {
                    thread::sleep(latency);
                }
                let outcome = loader.load(&request.asset);
                if !sender.send(request.sequence, outcome) {
                    debug!(
                        sequence = %request.sequence,
                        asset = %request.asset,
                        "Session gone; load result dropped"
                    );
                }
            })
        })
        .collect()
}
