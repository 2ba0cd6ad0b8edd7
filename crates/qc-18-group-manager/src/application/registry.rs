//! # Group Registry
//!
//! Authoritative table of groups, their descriptors and their live ledger
//! handles.
//!
//! ## Locking
//!
//! Each group id owns a slot with two locks:
//! - a write mutex serializing lifecycle operations on that group
//! - a read/write lock over the entry itself
//!
//! Readers (status queries, RPC dispatch) only take the entry lock, so they
//! see intermediate states such as `Stopping` while a writer holds the
//! group's write mutex. Slots for distinct ids share nothing, so lifecycle
//! operations on different groups never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};

use crate::domain::{GroupDescriptor, GroupId, GroupState};
use crate::ports::GroupLedger;

/// A registry entry: descriptor plus the ledger while Running.
#[derive(Clone)]
pub struct GroupEntry {
    /// Descriptor, including current state.
    pub descriptor: GroupDescriptor,
    /// Live instance; `Some` while Running or Stopping.
    pub ledger: Option<Arc<dyn GroupLedger>>,
}

impl GroupEntry {
    /// Entry for a group without a live ledger.
    pub fn detached(descriptor: GroupDescriptor) -> Self {
        Self {
            descriptor,
            ledger: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> GroupState {
        self.descriptor.state
    }
}

#[derive(Default)]
struct GroupSlot {
    write: Arc<Mutex<()>>,
    entry: RwLock<Option<GroupEntry>>,
}

/// Why a group cannot serve a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unservable {
    /// No such group.
    NotFound,
    /// Group exists in this non-Running state.
    NotRunning(GroupState),
}

/// Process-wide group table.
#[derive(Default)]
pub struct GroupRegistry {
    slots: DashMap<GroupId, Arc<GroupSlot>>,
}

impl GroupRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, group_id: GroupId) -> Option<Arc<GroupSlot>> {
        self.slots.get(&group_id).map(|s| Arc::clone(s.value()))
    }

    /// Current state; `NotFound` when there is no entry.
    pub fn state(&self, group_id: GroupId) -> GroupState {
        self.slot(group_id)
            .and_then(|slot| slot.entry.read().as_ref().map(GroupEntry::state))
            .unwrap_or(GroupState::NotFound)
    }

    /// Read-only copy of the descriptor.
    pub fn snapshot(&self, group_id: GroupId) -> Option<GroupDescriptor> {
        self.slot(group_id)
            .and_then(|slot| slot.entry.read().as_ref().map(|e| e.descriptor.clone()))
    }

    /// Ledger of a Running group.
    pub fn running_ledger(&self, group_id: GroupId) -> Result<Arc<dyn GroupLedger>, Unservable> {
        let slot = self.slot(group_id).ok_or(Unservable::NotFound)?;
        let entry = slot.entry.read();
        match entry.as_ref() {
            None => Err(Unservable::NotFound),
            Some(e) => match (&e.ledger, e.state()) {
                (Some(ledger), GroupState::Running) => Ok(Arc::clone(ledger)),
                (_, state) => Err(Unservable::NotRunning(state)),
            },
        }
    }

    /// Ids of every known group, ascending.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.ids_where(|_| true)
    }

    /// Ids of Running groups, ascending.
    pub fn running_group_ids(&self) -> Vec<GroupId> {
        self.ids_where(|state| state == GroupState::Running)
    }

    fn ids_where(&self, keep: impl Fn(GroupState) -> bool) -> Vec<GroupId> {
        // Collect slots first; no DashMap guard is held while reading entries.
        let slots: Vec<(GroupId, Arc<GroupSlot>)> = self
            .slots
            .iter()
            .map(|kv| (*kv.key(), Arc::clone(kv.value())))
            .collect();
        let mut ids: Vec<GroupId> = slots
            .into_iter()
            .filter(|(_, slot)| {
                slot.entry
                    .read()
                    .as_ref()
                    .map(|e| keep(e.state()))
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of known groups.
    pub fn len(&self) -> usize {
        self.group_ids().len()
    }

    /// No known groups?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the write lock of `group_id`, creating its slot if needed.
    ///
    /// Blocks while another writer holds the same group.
    pub fn lock(&self, group_id: GroupId) -> SlotWriter {
        let slot = Arc::clone(self.slots.entry(group_id).or_default().value());
        let guard = slot.write.lock_arc();
        SlotWriter {
            group_id,
            slot,
            _guard: guard,
        }
    }
}

/// Exclusive writer for one group's entry.
pub struct SlotWriter {
    group_id: GroupId,
    slot: Arc<GroupSlot>,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl SlotWriter {
    /// Group this writer holds.
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Current state.
    pub fn state(&self) -> GroupState {
        self.slot
            .entry
            .read()
            .as_ref()
            .map(GroupEntry::state)
            .unwrap_or(GroupState::NotFound)
    }

    /// Copy of the current entry.
    pub fn entry(&self) -> Option<GroupEntry> {
        self.slot.entry.read().clone()
    }

    /// Replace the entry; `None` removes the group.
    pub fn set(&mut self, entry: Option<GroupEntry>) {
        *self.slot.entry.write() = entry;
    }

    /// Change only the state, keeping descriptor and ledger.
    pub fn set_state(&mut self, state: GroupState) {
        if let Some(entry) = self.slot.entry.write().as_mut() {
            entry.descriptor.state = state;
        }
    }
}
