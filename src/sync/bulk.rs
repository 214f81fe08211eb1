use std::time::Duration;

use crate::services::{FetchError, ItemState, RawList, RetrieveApi, RetrieveQuery};

pub const PAGE_SIZE: u32 = 100;
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct BulkSettings {
    pub page_size: u32,
    /// Consecutive failures at one offset before giving up.
    pub max_attempts: u32,
    /// Delay after fault `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl BulkSettings {
    pub fn backoff(&self, faults: u32) -> Duration {
        let factor = 1u32.checked_shl(faults).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Downloads a whole state-filtered listing page by page.
pub struct BulkFetcher<A> {
    api: A,
    settings: BulkSettings,
}

impl<A: RetrieveApi> BulkFetcher<A> {
    pub fn new(api: A, settings: BulkSettings) -> Self {
        Self { api, settings }
    }

    /// Fetches every item in `state`, keyed by item id in page order.
    ///
    /// Pages are requested sequentially until one comes back empty. A failed
    /// request is retried at the same offset with exponential backoff; the
    /// fault counter resets after every successful page. Running out of
    /// attempts fails the whole fetch and drops the pages already collected.
    pub async fn fetch_all(&self, state: ItemState) -> Result<RawList, FetchError> {
        let mut records = RawList::new();
        let mut offset = 0u32;
        let mut faults = 0u32;

        loop {
            let query = RetrieveQuery::page(state, offset, self.settings.page_size);
            match self.api.retrieve(&query).await {
                Ok(response) => {
                    faults = 0;
                    let page = match response.list {
                        Some(list) if !list.is_empty() => list,
                        _ => break,
                    };
                    tracing::debug!("Fetched {} {:?} items at offset {}", page.len(), state, offset);
                    records.extend(page);
                    offset += self.settings.page_size;
                }
                Err(e) => {
                    faults += 1;
                    if faults >= self.settings.max_attempts {
                        tracing::warn!(
                            "Giving up on {:?} items at offset {} after {} attempts: {}",
                            state,
                            offset,
                            faults,
                            e
                        );
                        return Err(FetchError::RetriesExhausted {
                            offset,
                            attempts: faults,
                            source: Box::new(e),
                        });
                    }
                    let delay = self.settings.backoff(faults);
                    tracing::warn!(
                        "Fetching {:?} items at offset {} failed ({}), retrying in {}s",
                        state,
                        offset,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        tracing::info!("Fetched {} {:?} items", records.len(), state);
        Ok(records)
    }
}
