//! Local mirror of a Pocket reading list.
//!
//! Articles live in two JSON collections, unread and archived, next to a
//! watermark recording the last successful sync. The first sync downloads
//! both collections page by page; later syncs fetch only what changed since
//! the watermark and merge it in with [`sync::apply_delta`].

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod sync;
