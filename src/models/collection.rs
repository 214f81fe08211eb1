use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::{Article, ArticleStatus};
use crate::services::ItemState;

/// One of the two disjoint local collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Unread,
    Archived,
}

impl Partition {
    /// Partition an item with this status belongs to, if any.
    pub fn for_status(status: &ArticleStatus) -> Option<Self> {
        match status {
            ArticleStatus::Unread => Some(Self::Unread),
            ArticleStatus::Archived => Some(Self::Archived),
            ArticleStatus::Deleted(_) => None,
        }
    }

    /// State filter used when bulk fetching this partition.
    pub fn item_state(self) -> ItemState {
        match self {
            Self::Unread => ItemState::Unread,
            Self::Archived => ItemState::Archive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Articles of one partition keyed by `item_id`.
///
/// Keys are unique; inserting an article with an existing `item_id` replaces
/// the previous copy wholesale. Iteration is ordered by `item_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    items: BTreeMap<String, Article>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    pub fn get(&self, item_id: &str) -> Option<&Article> {
        self.items.get(item_id)
    }

    pub fn insert(&mut self, article: Article) -> Option<Article> {
        self.items.insert(article.item_id.clone(), article)
    }

    pub fn remove(&mut self, item_id: &str) -> Option<Article> {
        self.items.remove(item_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.items.values()
    }
}

impl FromIterator<Article> for Collection {
    fn from_iter<I: IntoIterator<Item = Article>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for article in iter {
            collection.insert(article);
        }
        collection
    }
}

/// Unix timestamp up to which the local mirror matches Pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> Article {
        Article {
            item_id: id.to_string(),
            resolved_title: None,
            resolved_url: None,
            given_url: None,
            excerpt: None,
            word_count: None,
            time_added: None,
            time_read: None,
            status: ArticleStatus::Unread,
            is_article: None,
            favorite: false,
            tags: Default::default(),
            downloaded_at: Utc::now(),
        }
    }

    #[test]
    fn insert_replaces_existing_item() {
        let mut collection = Collection::new();
        assert!(collection.insert(article("a")).is_none());

        let mut newer = article("a");
        newer.favorite = true;
        let previous = collection.insert(newer).expect("replaced");

        assert!(!previous.favorite);
        assert_eq!(collection.len(), 1);
        assert!(collection.get("a").unwrap().favorite);
    }

    #[test]
    fn collect_keeps_last_duplicate() {
        let mut second = article("a");
        second.resolved_title = Some("second".to_string());
        let collection: Collection = vec![article("a"), second, article("b")]
            .into_iter()
            .collect();

        assert_eq!(collection.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            collection.get("a").unwrap().resolved_title.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn partitions_follow_status() {
        assert_eq!(
            Partition::for_status(&ArticleStatus::Unread),
            Some(Partition::Unread)
        );
        assert_eq!(
            Partition::for_status(&ArticleStatus::Archived),
            Some(Partition::Archived)
        );
        assert_eq!(
            Partition::for_status(&ArticleStatus::Deleted("2".into())),
            None
        );
        assert_eq!(Partition::Archived.item_state(), ItemState::Archive);
    }

    #[test]
    fn watermark_orders_by_time() {
        assert!(Watermark::from_secs(10) < Watermark::from_secs(11));
        assert_eq!(
            Watermark::from_secs(0).to_string(),
            "1970-01-01 00:00:00 UTC"
        );
    }
}
