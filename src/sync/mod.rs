mod bulk;
mod delta;
mod normalizer;
mod reconciler;

#[cfg(test)]
pub(crate) mod testing;

pub use bulk::{BulkFetcher, BulkSettings, MAX_ATTEMPTS, PAGE_SIZE};
pub use delta::{DeltaBatch, DeltaFetcher};
pub use normalizer::{normalize_at, normalize_keyed, NormalizationError};
pub use reconciler::{
    apply_delta, DeltaCounts, PartitionChanges, Reconciler, SyncMode, SyncReport,
};

use crate::services::FetchError;
use crate::store::StoreError;

/// Why a sync run was aborted. Wraps the original cause unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("sync failed: {0}")]
    Normalization(#[from] NormalizationError),
    #[error("sync failed: {0}")]
    Store(#[from] StoreError),
}
