use crate::models::Watermark;
use crate::services::{FetchError, RawList, RetrieveApi, RetrieveQuery};

/// Items changed since a watermark, plus the watermark to store afterwards.
#[derive(Debug, Clone)]
pub struct DeltaBatch {
    pub changes: RawList,
    pub watermark: Watermark,
}

/// Fetches every change since a watermark in one request.
///
/// Failures are not retried. The stored watermark stays where it was, so the
/// next run asks for the same window again.
pub struct DeltaFetcher<A> {
    api: A,
}

impl<A: RetrieveApi> DeltaFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn fetch_since(&self, since: Watermark) -> Result<DeltaBatch, FetchError> {
        let requested_at = Watermark::now();
        let response = self
            .api
            .retrieve(&RetrieveQuery::changed_since(since.as_secs()))
            .await?;

        let changes = response.list.ok_or(FetchError::MissingList)?;
        let watermark = response
            .since
            .map(Watermark::from_secs)
            .unwrap_or(requested_at);

        tracing::debug!("{} items changed since {}", changes.len(), since);
        Ok(DeltaBatch { changes, watermark })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ItemState, RetrieveResponse};
    use crate::sync::testing::{delta_list, FakePocket};

    #[tokio::test]
    async fn returns_changes_and_server_cursor() {
        let api = FakePocket::new().with_delta(RetrieveResponse {
            list: Some(delta_list(&[("a", "1"), ("b", "2")])),
            since: Some(1_700_000_900),
        });

        let batch = DeltaFetcher::new(&api)
            .fetch_since(Watermark::from_secs(1_700_000_000))
            .await
            .unwrap();

        assert_eq!(batch.changes.len(), 2);
        assert_eq!(batch.watermark, Watermark::from_secs(1_700_000_900));

        let queries = api.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].state, ItemState::All);
        assert_eq!(queries[0].since, Some(1_700_000_000));
        assert_eq!(queries[0].offset, None);
    }

    #[tokio::test]
    async fn missing_cursor_falls_back_to_local_clock() {
        let api = FakePocket::new().with_delta(RetrieveResponse {
            list: Some(RawList::new()),
            since: None,
        });
        let before = Watermark::now();

        let batch = DeltaFetcher::new(&api)
            .fetch_since(Watermark::from_secs(1))
            .await
            .unwrap();

        assert!(batch.changes.is_empty());
        assert!(batch.watermark >= before);
        assert!(batch.watermark <= Watermark::now());
    }

    #[tokio::test]
    async fn missing_list_is_a_protocol_error() {
        let api = FakePocket::new().with_delta(RetrieveResponse {
            list: None,
            since: Some(5),
        });

        let err = DeltaFetcher::new(&api)
            .fetch_since(Watermark::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::MissingList));
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let api = FakePocket::new().failing(&[true]);

        let err = DeltaFetcher::new(&api)
            .fetch_since(Watermark::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
        assert_eq!(api.queries().len(), 1);
    }
}
