//! Object-storage interface for uploaded media.
//!
//! Uploads happen out of band: clients hand the API stable URLs plus
//! deletable reference ids. The only call that crosses this interface from
//! the core is best-effort deletion when a video, thumbnail, avatar or cover
//! image is replaced or removed.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Error from the object-storage backend.
#[derive(Debug)]
pub struct MediaError(pub String);

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Media storage error: {}", self.0)
    }
}

impl std::error::Error for MediaError {}

/// Interface to the remote object store.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Delete a stored object by its reference id.
    async fn delete(&self, file_ref: &str) -> Result<(), MediaError>;
}

/// Default backend that records deletions without talking to a remote
/// service. Deployments wire a real client behind the same trait.
pub struct DiscardMediaStore;

#[async_trait]
impl MediaStore for DiscardMediaStore {
    async fn delete(&self, file_ref: &str) -> Result<(), MediaError> {
        info!(file_ref = %file_ref, "Discarding media object");
        Ok(())
    }
}

/// Best-effort deletion: failures are logged, never surfaced to the caller.
pub async fn delete_best_effort(store: &Arc<dyn MediaStore>, file_ref: Option<&str>) {
    let Some(file_ref) = file_ref else {
        return;
    };
    if file_ref.is_empty() {
        return;
    }
    if let Err(e) = store.delete(file_ref).await {
        warn!(file_ref = %file_ref, error = %e, "Failed to delete media object");
    }
}
