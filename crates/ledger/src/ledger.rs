use std::collections::HashSet;

use subbot_common::error::AppError;
use subbot_common::types::MemberId;

use crate::LedgerStore;

/// In-memory view of the ledger, written through to its store.
///
/// `record` takes `&mut self`, so the owner (the notifier) is the only writer
/// and the `contains`-then-`record` sequence cannot interleave with another
/// task. Parallel sends would need an atomic check-and-set instead.
pub struct NotificationLedger {
    store: Box<dyn LedgerStore>,
    members: Vec<MemberId>,
    index: HashSet<MemberId>,
    /// Set when the last save failed, so the next `record` rewrites the file
    /// even if it adds nothing new.
    dirty: bool,
}

impl NotificationLedger {
    /// Load the ledger from `store`.
    ///
    /// Never fails: an unreadable or malformed store yields an empty ledger
    /// and a warning. Duplicate entries in the stored list are collapsed.
    pub fn load(store: impl LedgerStore + 'static) -> Self {
        let store: Box<dyn LedgerStore> = Box::new(store);

        let stored = match store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    store = %store.describe(),
                    error = %e,
                    "Could not read ledger, starting empty"
                );
                Vec::new()
            }
        };

        let mut ledger = Self {
            store,
            members: Vec::with_capacity(stored.len()),
            index: HashSet::with_capacity(stored.len()),
            dirty: false,
        };
        for id in stored {
            if ledger.index.insert(id.clone()) {
                ledger.members.push(id);
            }
        }

        tracing::info!(
            store = %ledger.store.describe(),
            members = ledger.members.len(),
            "Ledger loaded"
        );
        ledger
    }

    /// Whether `id` has already been welcomed.
    pub fn contains(&self, id: &MemberId) -> bool {
        self.index.contains(id)
    }

    /// Add `id` and persist the full set before returning.
    ///
    /// Returns `Ok(true)` if the id was new. Recording a known id is a no-op
    /// unless an earlier save failed, in which case the save is retried. On a
    /// save error the id stays recorded in memory.
    pub fn record(&mut self, id: MemberId) -> Result<bool, AppError> {
        let inserted = self.index.insert(id.clone());
        if inserted {
            self.members.push(id);
        }

        if inserted || self.dirty {
            if let Err(e) = self.store.save(&self.members) {
                self.dirty = true;
                return Err(e);
            }
            self.dirty = false;
        }

        Ok(inserted)
    }

    /// Recorded members in first-recorded order.
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn id(s: &str) -> MemberId {
        MemberId::new(s)
    }

    #[test]
    fn test_record_is_idempotent() {
        let store = MemoryStore::new();
        let mut ledger = NotificationLedger::load(store.clone());

        assert!(ledger.record(id("a@c.us")).unwrap());
        for _ in 0..4 {
            assert!(!ledger.record(id("a@c.us")).unwrap());
        }

        assert_eq!(ledger.len(), 1);
        assert_eq!(store.snapshot(), vec![id("a@c.us")]);
        // Only the first record touches storage.
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_load_collapses_duplicates() {
        let store = MemoryStore::with_members(vec![id("a"), id("b"), id("a")]);
        let ledger = NotificationLedger::load(store);
        assert_eq!(ledger.members(), &[id("a"), id("b")]);
    }

    #[test]
    fn test_load_failure_yields_empty_ledger() {
        let store = MemoryStore::new();
        store.fail_loads(true);
        let ledger = NotificationLedger::load(store);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_member_and_retries() {
        let store = MemoryStore::new();
        let mut ledger = NotificationLedger::load(store.clone());

        store.fail_saves(true);
        let err = ledger.record(id("a")).unwrap_err();
        assert!(matches!(err, AppError::PersistenceWrite(_)));
        assert!(ledger.contains(&id("a")));
        assert!(store.snapshot().is_empty());

        // Known id, but the previous write failed: the set is written again.
        store.fail_saves(false);
        assert!(!ledger.record(id("a")).unwrap());
        assert_eq!(store.snapshot(), vec![id("a")]);
    }

    #[test]
    fn test_members_keep_recording_order() {
        let mut ledger = NotificationLedger::load(MemoryStore::new());
        for m in ["c", "a", "b"] {
            ledger.record(id(m)).unwrap();
        }
        assert_eq!(ledger.members(), &[id("c"), id("a"), id("b")]);
    }
}
