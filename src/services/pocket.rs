use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

pub const POCKET_API_URL: &str = "https://getpocket.com";

/// Raw Pocket items keyed by `item_id`, in the order Pocket sent them.
pub type RawList = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {status}: {reason}")]
    HttpStatus { status: u16, reason: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("response has no item list")]
    MissingList,
    #[error("access token is missing, run `pocket-mirror authorize` first")]
    MissingAccessToken,
    #[error("giving up at offset {offset} after {attempts} attempts: {source}")]
    RetriesExhausted {
        offset: u32,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Unread,
    Archive,
    All,
}

/// Parameters of one `/v3/get` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrieveQuery {
    pub state: ItemState,
    #[serde(rename = "detailType")]
    pub detail_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
}

impl RetrieveQuery {
    /// One page of a state-filtered listing.
    pub fn page(state: ItemState, offset: u32, count: u32) -> Self {
        Self {
            state,
            detail_type: "complete",
            count: Some(count),
            offset: Some(offset),
            since: None,
        }
    }

    /// Everything changed since `since`, in any state.
    pub fn changed_since(since: i64) -> Self {
        Self {
            state: ItemState::All,
            detail_type: "complete",
            count: None,
            offset: None,
            since: Some(since),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default, deserialize_with = "deserialize_list")]
    pub list: Option<RawList>,
    #[serde(default, deserialize_with = "deserialize_since")]
    pub since: Option<i64>,
}

// Pocket sends `"list": []` instead of `{}` when there is nothing to return.
fn deserialize_list<'de, D>(deserializer: D) -> Result<Option<RawList>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| {
                    let id = match item.get("item_id")? {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    Some((id, item))
                })
                .collect(),
        )),
        other => Err(serde::de::Error::custom(format!(
            "expected item list, found {other}"
        ))),
    }
}

fn deserialize_since<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_i64()),
        Value::String(s) => Ok(s.trim().parse().ok()),
        _ => Ok(None),
    }
}

/// Source of Pocket listings. Implemented over HTTP by [`PocketClient`].
#[async_trait]
pub trait RetrieveApi: Send + Sync {
    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse, FetchError>;
}

#[async_trait]
impl<T: RetrieveApi + ?Sized> RetrieveApi for &T {
    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse, FetchError> {
        (**self).retrieve(query).await
    }
}

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    #[serde(flatten)]
    query: &'a RetrieveQuery,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub consumer_key: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

pub struct PocketClient {
    client: Client,
    endpoint: Url,
    consumer_key: String,
    access_token: String,
}

impl PocketClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let access_token = settings
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(FetchError::MissingAccessToken)?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pocket-mirror/1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&settings.base_url)?.join("v3/get")?,
            consumer_key: settings.consumer_key,
            access_token,
        })
    }
}

#[async_trait]
impl RetrieveApi for PocketClient {
    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse, FetchError> {
        let request = RetrieveRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            query,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .headers()
                .get("X-Error")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                reason,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
