use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::model::ResponseRecord;

const SAVED_FILE: &str = "saved_components.json";
const API_KEY_FILE: &str = "api_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no storage directory available")]
    Unavailable,
    #[error("storage io: {0}")]
    Io(#[from] io::Error),
    #[error("storage encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk home for the pieces that outlive a session: the API key and the
/// saved cards. Both are written whole on every change, so the files always
/// reflect the last successful write. Loads are tolerant; anything missing
/// or unreadable acts like an empty store.
pub struct SavedStore {
    root: Option<PathBuf>,
}

impl SavedStore {
    pub fn open_default() -> Self {
        match dirs::data_dir() {
            Some(base) => Self::with_root(base.join("nihilo-panel")),
            None => {
                tracing::warn!("no data directory; keys and saved cards will not persist");
                Self::disabled()
            }
        }
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root: Some(root) }
    }

    pub fn disabled() -> Self {
        Self { root: None }
    }

    pub fn load_saved(&self) -> Vec<ResponseRecord> {
        let Some(path) = self.file_path(SAVED_FILE) else {
            return Vec::new();
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!("could not read {}: {err}", path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("ignoring unreadable saved cards: {err}");
                Vec::new()
            }
        }
    }

    pub fn write_saved(&self, records: &[ResponseRecord]) -> Result<(), StoreError> {
        let path = self.file_path(SAVED_FILE).ok_or(StoreError::Unavailable)?;
        self.ensure_root()?;
        let text = serde_json::to_string_pretty(records)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load_api_key(&self) -> Option<String> {
        let path = self.file_path(API_KEY_FILE)?;
        let text = fs::read_to_string(path).ok()?;
        let key = text.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    pub fn store_api_key(&self, key: &str) -> Result<(), StoreError> {
        let path = self.file_path(API_KEY_FILE).ok_or(StoreError::Unavailable)?;
        self.ensure_root()?;
        fs::write(path, key.trim())?;
        Ok(())
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        let root = self.root.as_ref().ok_or(StoreError::Unavailable)?;
        fs::create_dir_all(root)?;
        Ok(())
    }

    fn file_path(&self, name: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> ResponseRecord {
        ResponseRecord {
            id: id.to_string(),
            user_input: format!("question {id}"),
            ..ResponseRecord::default()
        }
    }

    #[test]
    fn test_saved_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SavedStore::with_root(dir.path().join("panel"));
        store.write_saved(&[record("a"), record("b")]).unwrap();
        let loaded = store.load_saved();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1].user_input, "question b");
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = SavedStore::with_root(dir.path().to_path_buf());
        assert!(store.load_saved().is_empty());
        assert!(store.load_api_key().is_none());
    }

    #[test]
    fn test_unreadable_saved_reads_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SAVED_FILE), "not json").unwrap();
        let store = SavedStore::with_root(dir.path().to_path_buf());
        assert!(store.load_saved().is_empty());
    }

    #[test]
    fn test_api_key_roundtrip_trims() {
        let dir = TempDir::new().unwrap();
        let store = SavedStore::with_root(dir.path().to_path_buf());
        store.store_api_key("  sk-123  ").unwrap();
        assert_eq!(store.load_api_key().as_deref(), Some("sk-123"));
    }

    #[test]
    fn test_disabled_store_is_inert() {
        let store = SavedStore::disabled();
        assert!(store.load_saved().is_empty());
        assert!(store.load_api_key().is_none());
        assert!(matches!(
            store.write_saved(&[]),
            Err(StoreError::Unavailable)
        ));
    }
}
