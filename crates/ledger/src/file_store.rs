//! JSON file store — the ledger as a flat JSON array of member ids.
//!
//! Every save rewrites the whole file through a sibling temp file that is
//! fsynced and then renamed over the target. A crash mid-save leaves either
//! the previous file or the new one, never a truncated mix.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use subbot_common::error::AppError;
use subbot_common::types::MemberId;

use crate::LedgerStore;

/// File-backed ledger store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Vec<MemberId>, AppError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "No ledger file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::PersistenceRead(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&text).map_err(|e| {
            AppError::PersistenceRead(format!("{}: malformed ledger: {}", self.path.display(), e))
        })
    }

    fn save(&self, members: &[MemberId]) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(members)
            .map_err(|e| AppError::PersistenceWrite(e.to_string()))?;

        self.write_atomically(&json).map_err(|e| {
            AppError::PersistenceWrite(format!("{}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("sent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        let store = JsonFileStore::new(&path);

        store
            .save(&[MemberId::new("a@c.us"), MemberId::new("b@c.us")])
            .unwrap();

        let raw: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["a@c.us", "b@c.us"]);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state").join("sent.json"));
        store.save(&[MemberId::new("a@c.us")]).unwrap();
        assert_eq!(store.load().unwrap(), vec![MemberId::new("a@c.us")]);
    }

    #[test]
    fn test_malformed_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, AppError::PersistenceRead(_)));
    }

    #[test]
    fn test_wrong_shape_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        fs::write(&path, r#"{"sent": ["a@c.us"]}"#).unwrap();

        assert!(JsonFileStore::new(&path).load().is_err());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = JsonFileStore::new("/var/lib/subbot/sent.json");
        assert_eq!(store.temp_path(), PathBuf::from("/var/lib/subbot/sent.json.tmp"));
    }
}
