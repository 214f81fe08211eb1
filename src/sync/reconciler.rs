use std::fmt;

use chrono::{DateTime, Utc};

use super::bulk::{BulkFetcher, BulkSettings};
use super::delta::DeltaFetcher;
use super::normalizer::normalize_keyed;
use super::SyncError;
use crate::models::{Collection, Partition, Watermark};
use crate::services::{RawList, RetrieveApi};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No watermark yet: both partitions were downloaded in full.
    Full,
    /// Only changes since the stored watermark were applied.
    Incremental,
}

/// How one partition changed during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionChanges {
    pub before: usize,
    pub after: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Per-partition counters for one applied delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaCounts {
    pub unread: PartitionChanges,
    pub archived: PartitionChanges,
    pub deleted: usize,
}

impl DeltaCounts {
    fn partition_mut(&mut self, partition: Partition) -> &mut PartitionChanges {
        match partition {
            Partition::Unread => &mut self.unread,
            Partition::Archived => &mut self.archived,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub modified: usize,
    pub unread: PartitionChanges,
    pub archived: PartitionChanges,
    pub previous_watermark: Option<Watermark>,
    pub watermark: Watermark,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            SyncMode::Full => writeln!(f, "Initial download complete")?,
            SyncMode::Incremental => writeln!(f, "Modified articles: {}", self.modified)?,
        }
        for (label, c) in [("Unread", &self.unread), ("Archived", &self.archived)] {
            writeln!(
                f,
                "{label} articles: {} -> {} (+{} ~{} -{})",
                c.before, c.after, c.added, c.updated, c.removed
            )?;
        }
        write!(f, "Synced up to {}", self.watermark)
    }
}

/// Keeps the local partitions in step with Pocket.
pub struct Reconciler<A> {
    api: A,
    store: Store,
    bulk: BulkSettings,
}

impl<A: RetrieveApi> Reconciler<A> {
    pub fn new(api: A, store: Store, bulk: BulkSettings) -> Self {
        Self { api, store, bulk }
    }

    /// Runs one sync. Without a stored watermark both partitions are
    /// downloaded in full; otherwise only the changes since it are applied.
    ///
    /// Collections are written before the watermark, so an interrupted run
    /// never advances the watermark past data that was not saved.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        tracing::info!("Starting sync");
        let report = match self.store.load_watermark()? {
            None => {
                tracing::info!("No previous sync found, performing full download");
                self.full_sync().await?
            }
            Some(since) => {
                tracing::info!("Fetching changes since {}", since);
                self.incremental_sync(since).await?
            }
        };
        tracing::info!("Sync completed");
        Ok(report)
    }

    async fn full_sync(&self) -> Result<SyncReport, SyncError> {
        // Anything changed while downloading shows up again in the next delta.
        let started = Watermark::now();
        let downloaded_at = Utc::now();

        let fetcher = BulkFetcher::new(&self.api, self.bulk.clone());
        let unread_raw = fetcher.fetch_all(Partition::Unread.item_state()).await?;
        let archived_raw = fetcher.fetch_all(Partition::Archived.item_state()).await?;

        // Both listings go through the delta merge, so an item archived between
        // the two downloads ends up only in the partition its status names.
        let mut unread = Collection::new();
        let mut archived = Collection::new();
        for listing in [&unread_raw, &archived_raw] {
            apply_delta(&mut unread, &mut archived, listing, downloaded_at)?;
        }

        self.store.save_collection(Partition::Unread, &unread)?;
        self.store.save_collection(Partition::Archived, &archived)?;
        self.store.save_watermark(started)?;

        let full = |c: &Collection| PartitionChanges {
            after: c.len(),
            added: c.len(),
            ..Default::default()
        };
        Ok(SyncReport {
            mode: SyncMode::Full,
            modified: unread.len() + archived.len(),
            unread: full(&unread),
            archived: full(&archived),
            previous_watermark: None,
            watermark: started,
        })
    }

    async fn incremental_sync(&self, since: Watermark) -> Result<SyncReport, SyncError> {
        let batch = DeltaFetcher::new(&self.api).fetch_since(since).await?;

        let mut unread = self.store.load_collection(Partition::Unread)?;
        let mut archived = self.store.load_collection(Partition::Archived)?;

        let counts = apply_delta(&mut unread, &mut archived, &batch.changes, Utc::now())?;

        self.store.save_collection(Partition::Unread, &unread)?;
        self.store.save_collection(Partition::Archived, &archived)?;

        if batch.watermark < since {
            tracing::warn!(
                "Pocket reported a cursor ({}) older than the last sync ({}), keeping the last sync",
                batch.watermark,
                since
            );
        }
        let watermark = batch.watermark.max(since);
        self.store.save_watermark(watermark)?;

        tracing::info!("Modified articles: {}", batch.changes.len());
        tracing::info!("Unread articles: {} -> {}", counts.unread.before, counts.unread.after);
        tracing::info!(
            "Archived articles: {} -> {}",
            counts.archived.before,
            counts.archived.after
        );

        Ok(SyncReport {
            mode: SyncMode::Incremental,
            modified: batch.changes.len(),
            unread: counts.unread,
            archived: counts.archived,
            previous_watermark: Some(since),
            watermark,
        })
    }
}

/// Merges a batch of changed items into the two partitions.
///
/// Each item is first removed from both partitions and then inserted into
/// the one matching its new status; any status other than unread or archived
/// leaves it out of both. Applying the same batch twice gives the same
/// partitions as applying it once.
///
/// Every record is normalized before either partition is touched, so a
/// malformed record leaves both unchanged.
pub fn apply_delta(
    unread: &mut Collection,
    archived: &mut Collection,
    changes: &RawList,
    downloaded_at: DateTime<Utc>,
) -> Result<DeltaCounts, SyncError> {
    let articles = changes
        .iter()
        .map(|(item_id, record)| {
            normalize_keyed(item_id, record, downloaded_at).map(|article| (item_id, article))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut counts = DeltaCounts::default();
    counts.unread.before = unread.len();
    counts.archived.before = archived.len();

    for (item_id, mut article) in articles {
        // informational only, the merge below does not depend on it
        let was_in = if unread.contains(item_id) {
            Some(Partition::Unread)
        } else if archived.contains(item_id) {
            Some(Partition::Archived)
        } else {
            None
        };

        tracing::debug!("Article modified: {}", article.title());
        tracing::debug!(
            "  Status: {} (was in {})",
            article.status,
            was_in.map_or("neither collection", Partition::label)
        );
        tracing::debug!("  Favorite: {}", article.favorite);
        tracing::debug!(
            "  Tags: {}",
            article.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        );

        unread.remove(item_id);
        archived.remove(item_id);

        let target = Partition::for_status(&article.status);
        match (was_in, target) {
            (Some(from), Some(to)) if from == to => counts.partition_mut(to).updated += 1,
            _ => {
                if let Some(from) = was_in {
                    counts.partition_mut(from).removed += 1;
                }
                if let Some(to) = target {
                    counts.partition_mut(to).added += 1;
                }
            }
        }

        match target {
            Some(partition) => {
                tracing::debug!("  -> Added to {}", partition);
                if article.item_id != *item_id {
                    article.item_id = item_id.clone();
                }
                match partition {
                    Partition::Unread => unread.insert(article),
                    Partition::Archived => archived.insert(article),
                };
            }
            None => {
                tracing::debug!("  -> Removed (deleted)");
                counts.deleted += 1;
            }
        }
    }

    counts.unread.after = unread.len();
    counts.archived.after = archived.len();
    Ok(counts)
}
