use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{Article, ArticleStatus};

#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("expected an item object, found {0}")]
    NotAnObject(&'static str),
    #[error("item has no item_id")]
    MissingItemId,
}

/// Builds the local copy of a raw Pocket item, stamped with `downloaded_at`.
pub fn normalize_at(
    record: &Value,
    downloaded_at: DateTime<Utc>,
) -> Result<Article, NormalizationError> {
    build(record, None, downloaded_at)
}

/// Like [`normalize_at`], but falls back to `item_id` when the record does
/// not carry its own id (delta entries are keyed by id).
pub fn normalize_keyed(
    item_id: &str,
    record: &Value,
    downloaded_at: DateTime<Utc>,
) -> Result<Article, NormalizationError> {
    build(record, Some(item_id), downloaded_at)
}

fn build(
    record: &Value,
    fallback_id: Option<&str>,
    downloaded_at: DateTime<Utc>,
) -> Result<Article, NormalizationError> {
    let fields = record
        .as_object()
        .ok_or_else(|| NormalizationError::NotAnObject(kind(record)))?;

    let item_id = text(fields, "item_id")
        .or_else(|| fallback_id.map(ToString::to_string))
        .ok_or(NormalizationError::MissingItemId)?;

    Ok(Article {
        item_id,
        resolved_title: text(fields, "resolved_title"),
        resolved_url: text(fields, "resolved_url"),
        given_url: text(fields, "given_url"),
        excerpt: text(fields, "excerpt"),
        word_count: text(fields, "word_count"),
        time_added: text(fields, "time_added"),
        time_read: text(fields, "time_read"),
        status: text(fields, "status")
            .map(ArticleStatus::from)
            .unwrap_or_default(),
        is_article: text(fields, "is_article"),
        favorite: text(fields, "favorite").as_deref() == Some("1"),
        tags: tags(fields),
        downloaded_at,
    })
}

// Pocket mixes strings and numbers for the same field across endpoints.
fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

// Tags arrive as `{ "name": { "item_id": .., "tag": "name" } }`; only names are kept.
fn tags(fields: &Map<String, Value>) -> BTreeSet<String> {
    match fields.get("tags") {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => BTreeSet::new(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
