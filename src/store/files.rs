use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{Article, Collection, Partition, Watermark};

pub const UNREAD_FILE: &str = "unread_articles.json";
pub const ARCHIVED_FILE: &str = "archived_articles.json";
pub const LAST_SYNC_FILE: &str = "last_sync.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub data_dir: PathBuf,
    pub unread_file: String,
    pub archived_file: String,
    pub last_sync_file: String,
}

impl StoreSettings {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            unread_file: UNREAD_FILE.to_string(),
            archived_file: ARCHIVED_FILE.to_string(),
            last_sync_file: LAST_SYNC_FILE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LastSync {
    last_sync: i64,
}

/// JSON files holding the two partitions and the last sync watermark.
///
/// Every save replaces the whole file: content is written to a sibling
/// `.tmp` file first and then renamed over the target.
#[derive(Debug, Clone)]
pub struct Store {
    settings: StoreSettings,
}

impl Store {
    pub fn new(settings: StoreSettings) -> Self {
        Self { settings }
    }

    pub fn collection_path(&self, partition: Partition) -> PathBuf {
        let name = match partition {
            Partition::Unread => &self.settings.unread_file,
            Partition::Archived => &self.settings.archived_file,
        };
        self.settings.data_dir.join(name)
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.settings.data_dir.join(&self.settings.last_sync_file)
    }

    /// Loads a partition. A missing file is an empty collection.
    pub fn load_collection(&self, partition: Partition) -> Result<Collection, StoreError> {
        let path = self.collection_path(partition);
        let Some(content) = read_optional(&path)? else {
            return Ok(Collection::new());
        };
        let articles: Vec<Article> =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        Ok(articles.into_iter().collect())
    }

    pub fn save_collection(
        &self,
        partition: Partition,
        collection: &Collection,
    ) -> Result<(), StoreError> {
        let path = self.collection_path(partition);
        let articles: Vec<&Article> = collection.articles().collect();
        let content = serde_json::to_string_pretty(&articles).map_err(|source| {
            StoreError::Encode {
                path: path.clone(),
                source,
            }
        })?;
        write_replacing(&path, &content)?;
        tracing::debug!("Wrote {} {} articles to {:?}", collection.len(), partition, path);
        Ok(())
    }

    /// Last successful sync, or `None` if the mirror was never synced.
    pub fn load_watermark(&self) -> Result<Option<Watermark>, StoreError> {
        let path = self.watermark_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        let last: LastSync =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        Ok(Some(Watermark::from_secs(last.last_sync)))
    }

    pub fn save_watermark(&self, watermark: Watermark) -> Result<(), StoreError> {
        let path = self.watermark_path();
        let content = serde_json::to_string(&LastSync {
            last_sync: watermark.as_secs(),
        })
        .map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        write_replacing(&path, &content)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_replacing(path: &Path, content: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, format!("{content}\n")).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}
