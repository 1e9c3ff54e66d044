//! TxObject: the in-transaction wrapper pairing a committed snapshot with
//! its transactional working copy.

use super::{Snapshot, WrapperState};

/// Created once per distinct snapshot per transaction. `data` is the working
/// copy; until the first write it mirrors `committed`.
#[derive(Debug, Clone, PartialEq)]
pub struct TxObject {
    committed: Option<Snapshot>,
    data: Snapshot,
    written: bool,
    state: WrapperState,
}

impl TxObject {
    /// Wrapper over data read from storage or the cache.
    pub fn committed(data: Snapshot) -> Self {
        Self {
            committed: Some(data.clone()),
            data,
            written: false,
            state: WrapperState::Committed,
        }
    }

    /// Wrapper over brand-new data.
    pub fn to_be_inserted(data: Snapshot) -> Self {
        Self {
            committed: None,
            data,
            written: true,
            state: WrapperState::ToBeInserted,
        }
    }

    /// Wrapper for a replacement segment that remembers the row it came from.
    pub fn replacing(committed: Option<Snapshot>, data: Snapshot) -> Self {
        Self {
            committed,
            data,
            written: true,
            state: WrapperState::ToBeInserted,
        }
    }

    pub fn state(&self) -> WrapperState {
        self.state
    }

    pub fn committed_data(&self) -> Option<&Snapshot> {
        self.committed.as_ref()
    }

    pub fn data_for_read(&self) -> &Snapshot {
        &self.data
    }

    pub fn data_for_write(&mut self) -> &mut Snapshot {
        self.written = true;
        &mut self.data
    }

    pub fn has_written(&self) -> bool {
        self.written
    }

    pub fn is_new_in_this_transaction(&self) -> bool {
        matches!(
            self.state,
            WrapperState::Inserted | WrapperState::ToBeInserted
        )
    }

    pub fn is_deleted(&self) -> bool {
        self.state == WrapperState::Deleted
    }

    /// Buffered inserts are logged whole, so later edits need no separate update.
    pub fn needs_transactional_update(&self) -> bool {
        self.state != WrapperState::ToBeInserted
    }

    /// Bumps the committed stamp and, if the working copy is still unwritten,
    /// keeps it in step.
    pub fn bump_versions(&mut self) {
        if let Some(committed) = self.committed.as_mut() {
            committed.bump_version();
            if !self.written {
                self.data.version = committed.version;
                return;
            }
        }
        self.data.bump_version();
    }

    pub fn bump_committed_version(&mut self) {
        if let Some(committed) = self.committed.as_mut() {
            committed.bump_version();
            if !self.written {
                self.data.version = committed.version;
            }
        }
    }

    /// New wrapper that will insert a copy of this one's current data.
    pub fn copy_for_insert(&self) -> TxObject {
        TxObject {
            committed: self.committed.clone(),
            data: self.data.successor(),
            written: true,
            state: WrapperState::ToBeInserted,
        }
    }

    /// Tombstone standing in for this wrapper's committed row.
    pub fn copy_for_delete(&self) -> TxObject {
        let data = self.committed.clone().unwrap_or_else(|| self.data.clone());
        TxObject {
            committed: self.committed.clone(),
            data,
            written: false,
            state: WrapperState::Deleted,
        }
    }

    pub fn set_to_be_updated(&mut self) {
        if !self.is_new_in_this_transaction() && self.state != WrapperState::Deleted {
            self.state = WrapperState::ToBeUpdated;
        }
    }

    /// The buffered insert reached the log. The committed copy follows the
    /// working copy when there was none or its from-dates moved.
    pub fn mark_inserted(&mut self) {
        if self.state == WrapperState::Deleted {
            return;
        }
        self.state = WrapperState::Inserted;
        let refresh = match &self.committed {
            None => true,
            Some(committed) => !committed.same_from_dates(&self.data),
        };
        if refresh {
            self.committed = Some(self.data.clone());
        }
    }

    pub fn mark_updated(&mut self) {
        if self.state == WrapperState::ToBeUpdated {
            self.state = WrapperState::Updated;
        }
    }

    pub fn mark_deleted(&mut self) {
        self.state = WrapperState::Deleted;
    }

    /// Settles the wrapper at commit. Returns the snapshot that is now durable,
    /// or `None` when the row was removed.
    pub fn handle_commit(&mut self) -> Option<&Snapshot> {
        if self.state == WrapperState::Deleted {
            return None;
        }
        self.committed = Some(self.data.clone());
        self.written = false;
        self.state = WrapperState::Committed;
        self.committed.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_keeps_committed_untouched() {
        let mut w = TxObject::committed(Snapshot::new("E1").with_attribute("qty", 1));
        w.data_for_write().set_attribute("qty", 2.into());
        assert_eq!(w.committed_data().unwrap().attribute("qty"), Some(&1.into()));
        assert_eq!(w.data_for_read().attribute("qty"), Some(&2.into()));
    }

    #[test]
    fn copy_for_insert_is_new() {
        let w = TxObject::committed(Snapshot::new("E1"));
        let copy = w.copy_for_insert();
        assert!(copy.is_new_in_this_transaction());
        assert!(!copy.needs_transactional_update());
        assert_eq!(copy.data_for_read().version, 1);
    }

    #[test]
    fn set_to_be_updated_leaves_new_wrappers_alone() {
        let mut w = TxObject::to_be_inserted(Snapshot::new("E1"));
        w.set_to_be_updated();
        assert_eq!(w.state(), WrapperState::ToBeInserted);
    }

    #[test]
    fn deleted_wrapper_commits_to_nothing() {
        let mut w = TxObject::committed(Snapshot::new("E1")).copy_for_delete();
        assert!(w.handle_commit().is_none());
    }
}
