//! In-memory [`ConfigStore`] with failure injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::domain::{GenesisConfig, GroupConfig, GroupId, GroupState, StoreError};
use crate::ports::{ConfigStore, GroupFile};

#[derive(Default)]
struct Files {
    genesis: BTreeMap<GroupId, GenesisConfig>,
    configs: HashMap<GroupId, GroupConfig>,
    status: HashMap<GroupId, GroupState>,
}

/// Volatile config store.
#[derive(Default)]
pub struct InMemoryConfigStore {
    files: Mutex<Files>,
    fail_group_config_writes: AtomicBool,
    fail_status_writes: AtomicBool,
    lose_genesis_race: AtomicBool,
    genesis_writes: AtomicUsize,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every group config write fail.
    pub fn fail_group_config_writes(&self, fail: bool) {
        self.fail_group_config_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every status marker write fail.
    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    /// Let another writer create the genesis between the existence check
    /// and the next genesis write, which then fails as already present.
    pub fn lose_genesis_race(&self, lose: bool) {
        self.lose_genesis_race.store(lose, Ordering::SeqCst);
    }

    /// Number of successful genesis writes so far.
    pub fn genesis_write_count(&self) -> usize {
        self.genesis_writes.load(Ordering::SeqCst)
    }

    /// Drop a group's genesis (simulates an operator deleting the file).
    pub fn delete_genesis(&self, group_id: GroupId) {
        self.files.lock().genesis.remove(&group_id);
    }

    /// Drop a group's config (simulates an operator deleting the file).
    pub fn delete_group_config(&self, group_id: GroupId) {
        self.files.lock().configs.remove(&group_id);
    }
}

fn injected(what: &str, group_id: GroupId) -> StoreError {
    StoreError::Io {
        path: format!("memory://group{}/{}", group_id, what),
        error: "injected failure".to_string(),
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn genesis_exists(&self, group_id: GroupId) -> bool {
        self.files.lock().genesis.contains_key(&group_id)
    }

    fn group_config_exists(&self, group_id: GroupId) -> bool {
        self.files.lock().configs.contains_key(&group_id)
    }

    fn write_genesis(&self, group_id: GroupId, genesis: &GenesisConfig) -> Result<(), StoreError> {
        let mut files = self.files.lock();
        if self.lose_genesis_race.swap(false, Ordering::SeqCst) {
            files.genesis.insert(group_id, genesis.clone());
        }
        if files.genesis.contains_key(&group_id) {
            return Err(StoreError::AlreadyExists(format!("group.{}.genesis", group_id)));
        }
        files.genesis.insert(group_id, genesis.clone());
        self.genesis_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_group_config(
        &self,
        group_id: GroupId,
        config: &GroupConfig,
    ) -> Result<(), StoreError> {
        if self.fail_group_config_writes.load(Ordering::SeqCst) {
            return Err(injected("ini", group_id));
        }
        let mut files = self.files.lock();
        if files.configs.contains_key(&group_id) {
            return Err(StoreError::AlreadyExists(format!("group.{}.ini", group_id)));
        }
        files.configs.insert(group_id, config.clone());
        Ok(())
    }

    fn read_genesis(&self, group_id: GroupId) -> Result<Option<GenesisConfig>, StoreError> {
        Ok(self.files.lock().genesis.get(&group_id).cloned())
    }

    fn read_group_config(&self, group_id: GroupId) -> Result<Option<GroupConfig>, StoreError> {
        Ok(self.files.lock().configs.get(&group_id).cloned())
    }

    fn remove_group_files(
        &self,
        group_id: GroupId,
        targets: &[GroupFile],
    ) -> Result<(), StoreError> {
        let mut files = self.files.lock();
        for target in targets {
            match target {
                GroupFile::Genesis => {
                    files.genesis.remove(&group_id);
                }
                GroupFile::GroupConfig => {
                    files.configs.remove(&group_id);
                }
                GroupFile::Status => {
                    files.status.remove(&group_id);
                }
            }
        }
        Ok(())
    }

    fn write_status(&self, group_id: GroupId, state: GroupState) -> Result<(), StoreError> {
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(injected("status", group_id));
        }
        self.files.lock().status.insert(group_id, state);
        Ok(())
    }

    fn read_status(&self, group_id: GroupId) -> Result<Option<GroupState>, StoreError> {
        Ok(self.files.lock().status.get(&group_id).copied())
    }

    fn list_groups(&self) -> Result<Vec<GroupId>, StoreError> {
        Ok(self.files.lock().genesis.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_genesis() {
        let store = InMemoryConfigStore::new();
        store.write_genesis(2, &GenesisConfig::template()).unwrap();
        assert!(store.write_genesis(2, &GenesisConfig::template()).is_err());
        assert_eq!(store.genesis_write_count(), 1);
    }

    #[test]
    fn test_injected_failures() {
        let store = InMemoryConfigStore::new();
        store.fail_group_config_writes(true);
        assert!(store.write_group_config(2, &GroupConfig::default()).is_err());
        store.fail_status_writes(true);
        assert!(store.write_status(2, GroupState::Stopped).is_err());
        store.fail_status_writes(false);
        assert!(store.write_status(2, GroupState::Stopped).is_ok());
    }
}
