//! Sub-store activation state (§4.6). A sub-store only starts serving reads
//! and writes once an explicit `migrate(...)` call has transitioned it to
//! `Active` — even a migration that moves zero rows counts, since the point
//! is an observable activation event, not data volume.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStoreStatus {
    Dormant,
    Migrating,
    Active,
    Failed,
}

impl SubStoreStatus {
    fn to_u8(self) -> u8 {
        match self {
            SubStoreStatus::Dormant => 0,
            SubStoreStatus::Migrating => 1,
            SubStoreStatus::Active => 2,
            SubStoreStatus::Failed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SubStoreStatus::Migrating,
            2 => SubStoreStatus::Active,
            3 => SubStoreStatus::Failed,
            _ => SubStoreStatus::Dormant,
        }
    }
}

/// Atomic holder so concurrent writers checking "is this sub-store eligible
/// right now" never need a lock (§5 concurrency model).
#[derive(Debug)]
pub struct SubStoreState(AtomicU8);

impl SubStoreState {
    pub fn new(status: SubStoreStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn get(&self) -> SubStoreStatus {
        SubStoreStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, status: SubStoreStatus) {
        self.0.store(status.to_u8(), Ordering::SeqCst);
    }

    /// Writers during migration must not "miss" a sub-store whose filter
    /// already matches (§4.6 idempotence/interleaving note).
    pub fn accepts_writes(&self) -> bool {
        matches!(self.get(), SubStoreStatus::Migrating | SubStoreStatus::Active)
    }

    pub fn accepts_reads(&self) -> bool {
        self.get() == SubStoreStatus::Active
    }
}

impl Default for SubStoreState {
    fn default() -> Self {
        Self::new(SubStoreStatus::Dormant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_substore_is_dormant() {
        assert_eq!(SubStoreState::default().get(), SubStoreStatus::Dormant);
    }

    #[test]
    fn migrating_substore_accepts_writes_but_not_reads() {
        let state = SubStoreState::new(SubStoreStatus::Migrating);
        assert!(state.accepts_writes());
        assert!(!state.accepts_reads());
    }

    #[test]
    fn active_substore_accepts_both() {
        let state = SubStoreState::new(SubStoreStatus::Active);
        assert!(state.accepts_writes());
        assert!(state.accepts_reads());
    }
}
