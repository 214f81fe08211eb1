//! Scripted in-memory Pocket used by the sync tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::services::{FetchError, ItemState, RawList, RetrieveApi, RetrieveQuery, RetrieveResponse};

pub fn raw(item_id: &str, status: &str) -> Value {
    json!({
        "item_id": item_id,
        "resolved_title": format!("Article {item_id}"),
        "given_url": format!("https://example.com/{item_id}"),
        "status": status,
        "favorite": "0",
        "word_count": "120",
        "tags": { "saved": { "item_id": item_id, "tag": "saved" } }
    })
}

pub fn raw_items(prefix: &str, count: usize, status: &str) -> Vec<Value> {
    (0..count)
        .map(|i| raw(&format!("{prefix}{i:04}"), status))
        .collect()
}

pub fn delta_list(entries: &[(&str, &str)]) -> RawList {
    entries
        .iter()
        .map(|(id, status)| (id.to_string(), raw(id, status)))
        .collect()
}

fn unavailable() -> FetchError {
    FetchError::HttpStatus {
        status: 503,
        reason: "Service Unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakePocket {
    pages: HashMap<ItemState, Vec<Value>>,
    delta: Mutex<Option<RetrieveResponse>>,
    fail_plan: Mutex<VecDeque<bool>>,
    always_fail: Mutex<Option<ItemState>>,
    calls: Mutex<Vec<(RetrieveQuery, Instant)>>,
}

impl FakePocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, state: ItemState, items: Vec<Value>) -> Self {
        self.pages.insert(state, items);
        self
    }

    pub fn with_delta(self, response: RetrieveResponse) -> Self {
        *self.delta.lock().unwrap() = Some(response);
        self
    }

    /// The next calls fail (`true`) or go through (`false`) in this order.
    pub fn failing(self, plan: &[bool]) -> Self {
        self.fail_plan.lock().unwrap().extend(plan.iter().copied());
        self
    }

    /// Every listing request for `state` fails.
    pub fn failing_state(self, state: ItemState) -> Self {
        *self.always_fail.lock().unwrap() = Some(state);
        self
    }

    pub fn calls(&self) -> Vec<(RetrieveQuery, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<RetrieveQuery> {
        self.calls().into_iter().map(|(q, _)| q).collect()
    }
}

#[async_trait]
impl RetrieveApi for FakePocket {
    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse, FetchError> {
        self.calls.lock().unwrap().push((query.clone(), Instant::now()));

        let scripted = self.fail_plan.lock().unwrap().pop_front().unwrap_or(false);
        if scripted || *self.always_fail.lock().unwrap() == Some(query.state) {
            return Err(unavailable());
        }

        if query.since.is_some() {
            return self
                .delta
                .lock()
                .unwrap()
                .clone()
                .ok_or(FetchError::HttpStatus {
                    status: 500,
                    reason: "no delta scripted".to_string(),
                });
        }

        let items = self.pages.get(&query.state).cloned().unwrap_or_default();
        let offset = query.offset.unwrap_or(0) as usize;
        let count = query.count.unwrap_or(u32::MAX) as usize;
        let list: RawList = items
            .into_iter()
            .skip(offset)
            .take(count)
            .map(|item| {
                let id = item["item_id"].as_str().unwrap_or_default().to_string();
                (id, item)
            })
            .collect();

        Ok(RetrieveResponse {
            list: Some(list),
            since: None,
        })
    }
}
