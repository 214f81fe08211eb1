use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reading state of an item as reported by Pocket.
///
/// Pocket sends the status as a string: `"0"` unread, `"1"` archived, and
/// anything else (usually `"2"`) for an item that was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArticleStatus {
    Unread,
    Archived,
    /// Deleted or otherwise unreachable. Holds the raw wire code.
    Deleted(String),
}

impl ArticleStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => Self::Unread,
            "1" => Self::Archived,
            other => Self::Deleted(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Unread => "0",
            Self::Archived => "1",
            Self::Deleted(code) => code,
        }
    }
}

impl Default for ArticleStatus {
    fn default() -> Self {
        Self::Deleted(String::new())
    }
}

impl From<String> for ArticleStatus {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<ArticleStatus> for String {
    fn from(status: ArticleStatus) -> Self {
        status.code().to_string()
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unread => write!(f, "unread"),
            Self::Archived => write!(f, "archived"),
            Self::Deleted(code) => write!(f, "deleted ({code})"),
        }
    }
}

/// Local copy of one Pocket item.
///
/// Numeric-looking fields (`word_count`, `time_added`, ...) are kept exactly as
/// Pocket sends them. `downloaded_at` is set locally when the copy is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub item_id: String,
    #[serde(default)]
    pub resolved_title: Option<String>,
    #[serde(default)]
    pub resolved_url: Option<String>,
    #[serde(default)]
    pub given_url: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub word_count: Option<String>,
    #[serde(default)]
    pub time_added: Option<String>,
    #[serde(default)]
    pub time_read: Option<String>,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub is_article: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Written as RFC 3339. Older mirrors stored it without an offset; those
    /// are read as UTC.
    #[serde(deserialize_with = "deserialize_downloaded_at")]
    pub downloaded_at: DateTime<Utc>,
}

impl Article {
    /// Best display title: resolved title, then either URL.
    pub fn title(&self) -> &str {
        self.resolved_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.resolved_url.as_deref())
            .or(self.given_url.as_deref())
            .unwrap_or("No title")
    }
}

fn deserialize_downloaded_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // e.g. "2024-03-01T12:30:45.123456"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_partitions() {
        assert_eq!(ArticleStatus::from_code("0"), ArticleStatus::Unread);
        assert_eq!(ArticleStatus::from_code("1"), ArticleStatus::Archived);
        assert_eq!(
            ArticleStatus::from_code("2"),
            ArticleStatus::Deleted("2".to_string())
        );
        assert_eq!(ArticleStatus::Deleted("2".to_string()).code(), "2");
    }

    #[test]
    fn article_serializes_status_as_code_and_tags_as_array() {
        let article = Article {
            item_id: "42".to_string(),
            resolved_title: Some("Title".to_string()),
            resolved_url: None,
            given_url: Some("https://example.com".to_string()),
            excerpt: None,
            word_count: Some("900".to_string()),
            time_added: Some("1700000000".to_string()),
            time_read: Some("0".to_string()),
            status: ArticleStatus::Archived,
            is_article: Some("1".to_string()),
            favorite: true,
            tags: ["rust".to_string(), "async".to_string()].into_iter().collect(),
            downloaded_at: DateTime::from_timestamp(1_700_000_100, 0).unwrap(),
        };

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["status"], "1");
        assert_eq!(json["favorite"], true);
        assert_eq!(json["tags"], serde_json::json!(["async", "rust"]));

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn title_falls_back_to_urls() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "item_id": "1",
            "resolved_title": "",
            "given_url": "https://example.com/a",
            "downloaded_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(article.title(), "https://example.com/a");
        assert_eq!(article.status, ArticleStatus::Deleted(String::new()));
    }

    #[test]
    fn download_time_accepts_offset_free_timestamps() {
        let parsed = |raw: &str| {
            serde_json::from_value::<Article>(serde_json::json!({
                "item_id": "1",
                "downloaded_at": raw
            }))
            .map(|a| a.downloaded_at.timestamp())
        };

        assert_eq!(parsed("2024-01-01T00:00:00").unwrap(), 1_704_067_200);
        assert_eq!(parsed("2024-01-01T00:00:00.250000").unwrap(), 1_704_067_200);
        assert_eq!(parsed("2024-01-01T02:00:00+02:00").unwrap(), 1_704_067_200);
        assert!(parsed("yesterday").is_err());
    }
}
