mod files;

pub use files::{Store, StoreError, StoreSettings, ARCHIVED_FILE, LAST_SYNC_FILE, UNREAD_FILE};
