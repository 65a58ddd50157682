//! In-memory ledger store for tests and dry runs.

use std::sync::{Arc, Mutex, MutexGuard};

use subbot_common::error::AppError;
use subbot_common::types::MemberId;

use crate::LedgerStore;

#[derive(Debug, Default)]
struct Inner {
    members: Vec<MemberId>,
    saves: usize,
    fail_loads: bool,
    fail_saves: bool,
}

/// Shared in-memory store. Clones see the same state, so a test can keep a
/// handle while the ledger owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded as if `members` had been persisted earlier.
    pub fn with_members(members: Vec<MemberId>) -> Self {
        let store = Self::new();
        store.lock().members = members;
        store
    }

    /// Make subsequent `load` calls fail.
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Make subsequent `save` calls fail.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// The member list as last saved.
    pub fn snapshot(&self) -> Vec<MemberId> {
        self.lock().members.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Vec<MemberId>, AppError> {
        let inner = self.lock();
        if inner.fail_loads {
            return Err(AppError::PersistenceRead("memory store set to fail".into()));
        }
        Ok(inner.members.clone())
    }

    fn save(&self, members: &[MemberId]) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.fail_saves {
            return Err(AppError::PersistenceWrite("memory store set to fail".into()));
        }
        inner.members = members.to_vec();
        inner.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
