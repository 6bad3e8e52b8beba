use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod catalog;
pub mod history;

pub use catalog::{CatalogBackend, CatalogEntry, CatalogStore, NewCatalogEntry};
pub use history::{
    DEFAULT_HISTORY_LIMIT, HistoryBackend, HistoryEntry, HistoryRanking, HistoryStore,
    HistoryWeights, NewHistoryEntry,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Reads a JSON document, writing `T::default()` first when the file is missing.
fn load_or_init<T>(path: &Path) -> Result<T, StorageError>
where
    T: Default + Serialize + DeserializeOwned,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if !path.exists() {
        write_json(path, &T::default())?;
    }

    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
