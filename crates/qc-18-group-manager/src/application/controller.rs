//! # Group Lifecycle Controller
//!
//! Implements generate / start / stop / remove / recover / query on top of
//! the registry, the validation chain and the outbound ports.
//!
//! ## Outcome table
//!
//! | Op \ State | NotFound | Stopped | Running | Stopping | Deleted |
//! |------------|----------|---------|---------|----------|---------|
//! | generate   | Stopped  | 0x2     | 0x2     | 0x2      | 0x2     |
//! | start      | 0x6      | Running | 0x3     | 0xd      | 0x5     |
//! | stop       | 0x6      | 0x4     | Stopped | 0xd      | 0x5     |
//! | remove     | 0x6      | Deleted | 0x3     | 0xd      | 0x5     |
//! | recover    | 0x6      | 0xe     | 0xe     | 0xe      | Stopped |
//!
//! Every mutation happens while holding the group's write lock. Operations
//! first peek at the state without the lock so a caller arriving during a
//! stop sees `GROUP_IS_STOPPING` instead of queueing behind it.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::registry::{GroupEntry, GroupRegistry, SlotWriter};
use crate::algorithms::{check_connection, check_group_id, check_sealer_id, check_timestamp};
use crate::config::LifecycleConfig;
use crate::domain::{
    invariant_valid_transition, GroupDescriptor, GroupError, GroupId, GroupResult, GroupState,
    NodeId, StoreError,
};
use crate::ports::{
    Clock, ConfigStore, GenerateGroupRequest, GroupFile, GroupLifecycleApi, LedgerLauncher,
    P2pService,
};

/// What `load_persisted_groups` did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootSummary {
    /// Groups put back into the registry.
    pub restored: Vec<GroupId>,
    /// Groups started because their marker said RUNNING.
    pub started: Vec<GroupId>,
    /// Groups whose files could not be used.
    pub skipped: Vec<GroupId>,
}

/// Group lifecycle service.
pub struct GroupLifecycleController {
    config: LifecycleConfig,
    registry: Arc<GroupRegistry>,
    store: Arc<dyn ConfigStore>,
    launcher: Arc<dyn LedgerLauncher>,
    p2p: Arc<dyn P2pService>,
    clock: Arc<dyn Clock>,
}

impl GroupLifecycleController {
    /// Wire the controller to its collaborators.
    pub fn new(
        config: LifecycleConfig,
        registry: Arc<GroupRegistry>,
        store: Arc<dyn ConfigStore>,
        launcher: Arc<dyn LedgerLauncher>,
        p2p: Arc<dyn P2pService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            launcher,
            p2p,
            clock,
        }
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<GroupRegistry> {
        &self.registry
    }

    /// This node's identity.
    pub fn node_id(&self) -> &NodeId {
        &self.config.node_id
    }

    /// Active configuration.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    fn reject_if_stopping(&self, group_id: GroupId) -> GroupResult<()> {
        if self.registry.state(group_id) == GroupState::Stopping {
            return Err(GroupError::IsStopping(group_id));
        }
        Ok(())
    }

    fn persist_status(&self, group_id: GroupId, state: GroupState) -> GroupResult<()> {
        self.store.write_status(group_id, state).map_err(|e| {
            error!("[qc-18] group {}: failed to persist {} marker: {}", group_id, state, e);
            GroupError::from(e)
        })
    }

    /// Rebuild a descriptor from the files on disk.
    fn read_descriptor(&self, group_id: GroupId) -> GroupResult<GroupDescriptor> {
        let genesis = self
            .store
            .read_genesis(group_id)?
            .ok_or(GroupError::GenesisConfNotFound(group_id))?;
        let config = self
            .store
            .read_group_config(group_id)?
            .ok_or(GroupError::GroupConfNotFound(group_id))?;

        let corrupt = |error: String| {
            GroupError::Storage(StoreError::Parse {
                path: format!("group.{}.genesis", group_id),
                error,
            })
        };
        if genesis.group.id != group_id {
            return Err(corrupt(format!("declares group {}", genesis.group.id)));
        }
        if genesis.consensus.sealers.is_empty() {
            return Err(corrupt("empty sealer list".to_string()));
        }
        Ok(GroupDescriptor::new(group_id, genesis, config))
    }

    fn generate(&self, group_id: GroupId, request: &GenerateGroupRequest) -> GroupResult<()> {
        if self.registry.state(group_id) != GroupState::NotFound {
            return Err(GroupError::AlreadyExists(group_id));
        }
        let mut writer = self.registry.lock(group_id);
        if writer.state() != GroupState::NotFound {
            return Err(GroupError::AlreadyExists(group_id));
        }

        let sealers = check_sealer_id(&request.sealers)?;
        let timestamp = check_timestamp(
            &request.timestamp,
            self.clock.now_secs(),
            self.config.max_timestamp_skew_secs,
        )?;
        if self.store.genesis_exists(group_id) {
            return Err(GroupError::GenesisConfAlreadyExists(group_id));
        }
        if self.store.group_config_exists(group_id) {
            return Err(GroupError::GroupConfAlreadyExists(group_id));
        }

        let genesis = self
            .config
            .genesis_template
            .for_group(group_id, timestamp, &sealers);
        let group_config = self.config.group_template.clone();
        invariant_valid_transition(GroupState::NotFound, GroupState::Stopped)?;

        let mut written = Vec::with_capacity(3);
        let persisted = self
            .store
            .write_genesis(group_id, &genesis)
            .map(|_| written.push(GroupFile::Genesis))
            .and_then(|_| self.store.write_group_config(group_id, &group_config))
            .map(|_| written.push(GroupFile::GroupConfig))
            .and_then(|_| self.store.write_status(group_id, GroupState::Stopped));
        if let Err(e) = persisted {
            // Only files this call created are removed.
            error!("[qc-18] group {}: generate failed, rolling back: {}", group_id, e);
            if let Err(cleanup) = self.store.remove_group_files(group_id, &written) {
                error!("[qc-18] group {}: rollback cleanup failed: {}", group_id, cleanup);
            }
            writer.set(None);
            return Err(e.into());
        }

        let descriptor = GroupDescriptor::new(group_id, genesis, group_config);
        writer.set(Some(GroupEntry::detached(descriptor)));
        info!(
            "[qc-18] group {} generated with {} sealers",
            group_id,
            sealers.len()
        );
        Ok(())
    }

    fn start(&self, group_id: GroupId) -> GroupResult<()> {
        self.reject_if_stopping(group_id)?;
        let mut writer = self.registry.lock(group_id);
        let entry = writer.entry().ok_or(GroupError::NotFound(group_id))?;
        match entry.state() {
            GroupState::Stopped => {}
            GroupState::Running => return Err(GroupError::AlreadyRunning(group_id)),
            GroupState::Stopping => return Err(GroupError::IsStopping(group_id)),
            GroupState::Deleted => return Err(GroupError::AlreadyDeleted(group_id)),
            GroupState::NotFound => return Err(GroupError::NotFound(group_id)),
        }
        invariant_valid_transition(GroupState::Stopped, GroupState::Running)?;

        let descriptor = entry.descriptor;
        check_connection(
            &descriptor.sealers,
            &self.config.node_id,
            &self.p2p.connected_node_ids(),
        )?;

        let ledger = self.launcher.launch(&descriptor).map_err(|e| {
            error!("[qc-18] group {}: ledger failed to start: {}", group_id, e);
            GroupError::from(e)
        })?;

        if let Err(e) = self.persist_status(group_id, GroupState::Running) {
            if let Err(stop) = ledger.stop() {
                error!("[qc-18] group {}: stop after failed start: {}", group_id, stop);
            }
            return Err(e);
        }

        let mut descriptor = descriptor;
        descriptor.state = GroupState::Running;
        writer.set(Some(GroupEntry {
            descriptor,
            ledger: Some(ledger),
        }));
        info!("[qc-18] group {} started", group_id);
        Ok(())
    }

    /// Running -> Stopping -> Stopped under an already held write lock.
    fn stop_locked(&self, writer: &mut SlotWriter, persist: bool) -> GroupResult<()> {
        let group_id = writer.group_id();
        let entry = writer.entry().ok_or(GroupError::NotFound(group_id))?;
        match entry.state() {
            GroupState::Running => {}
            GroupState::Stopped => return Err(GroupError::AlreadyStopped(group_id)),
            GroupState::Stopping => return Err(GroupError::IsStopping(group_id)),
            GroupState::Deleted => return Err(GroupError::AlreadyDeleted(group_id)),
            GroupState::NotFound => return Err(GroupError::NotFound(group_id)),
        }
        invariant_valid_transition(GroupState::Running, GroupState::Stopping)?;
        writer.set_state(GroupState::Stopping);
        debug!("[qc-18] group {} stopping", group_id);

        // The marker goes first so a failed write leaves the group Running.
        if persist {
            if let Err(e) = self.persist_status(group_id, GroupState::Stopped) {
                writer.set_state(GroupState::Running);
                return Err(e);
            }
        }

        if let Some(ledger) = &entry.ledger {
            if let Err(e) = ledger.stop() {
                error!("[qc-18] group {}: ledger failed to stop: {}", group_id, e);
                if persist {
                    if let Err(restore) = self.persist_status(group_id, GroupState::Running) {
                        error!("[qc-18] group {}: RUNNING marker not restored: {}", group_id, restore);
                    }
                }
                writer.set_state(GroupState::Running);
                return Err(e.into());
            }
        }

        let mut descriptor = entry.descriptor;
        descriptor.state = GroupState::Stopped;
        writer.set(Some(GroupEntry::detached(descriptor)));
        info!("[qc-18] group {} stopped", group_id);
        Ok(())
    }

    fn stop(&self, group_id: GroupId) -> GroupResult<()> {
        self.reject_if_stopping(group_id)?;
        let mut writer = self.registry.lock(group_id);
        self.stop_locked(&mut writer, true)
    }

    fn remove(&self, group_id: GroupId) -> GroupResult<()> {
        self.reject_if_stopping(group_id)?;
        let mut writer = self.registry.lock(group_id);
        match writer.state() {
            GroupState::Stopped => {}
            GroupState::Running => return Err(GroupError::AlreadyRunning(group_id)),
            GroupState::Stopping => return Err(GroupError::IsStopping(group_id)),
            GroupState::Deleted => return Err(GroupError::AlreadyDeleted(group_id)),
            GroupState::NotFound => return Err(GroupError::NotFound(group_id)),
        }
        invariant_valid_transition(GroupState::Stopped, GroupState::Deleted)?;
        self.persist_status(group_id, GroupState::Deleted)?;
        writer.set_state(GroupState::Deleted);
        info!("[qc-18] group {} removed (configuration retained)", group_id);
        Ok(())
    }

    fn recover(&self, group_id: GroupId) -> GroupResult<()> {
        let mut writer = self.registry.lock(group_id);
        match writer.state() {
            GroupState::Deleted => {}
            GroupState::NotFound => return Err(GroupError::NotFound(group_id)),
            GroupState::Stopped | GroupState::Running | GroupState::Stopping => {
                return Err(GroupError::HasNotDeleted(group_id))
            }
        }
        invariant_valid_transition(GroupState::Deleted, GroupState::Stopped)?;

        let descriptor = self.read_descriptor(group_id).map_err(|e| {
            if e.is_internal() {
                error!("[qc-18] group {}: cannot read configuration: {}", group_id, e);
            }
            e
        })?;
        self.persist_status(group_id, GroupState::Stopped)?;
        writer.set(Some(GroupEntry::detached(descriptor)));
        info!("[qc-18] group {} recovered", group_id);
        Ok(())
    }

    /// Rebuild the registry from disk at node start.
    ///
    /// Deleted groups come back Deleted, every other group Stopped; groups
    /// whose marker says RUNNING are then started. Unreadable groups are
    /// skipped.
    pub fn load_persisted_groups(&self) -> GroupResult<BootSummary> {
        let ids = self.store.list_groups().map_err(|e| {
            error!("[qc-18] cannot list persisted groups: {}", e);
            GroupError::from(e)
        })?;

        let mut summary = BootSummary::default();
        let mut to_start = Vec::new();
        for group_id in ids {
            if check_group_id(i64::from(group_id)).is_err() {
                warn!("[qc-18] ignoring files of invalid group id {}", group_id);
                summary.skipped.push(group_id);
                continue;
            }
            let mut writer = self.registry.lock(group_id);
            if writer.state() != GroupState::NotFound {
                continue;
            }

            let mut descriptor = match self.read_descriptor(group_id) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("[qc-18] skipping group {}: {}", group_id, e);
                    summary.skipped.push(group_id);
                    continue;
                }
            };
            let marker = self.store.read_status(group_id).unwrap_or_else(|e| {
                warn!("[qc-18] group {}: unreadable status marker: {}", group_id, e);
                None
            });
            descriptor.state = match marker {
                Some(GroupState::Deleted) => GroupState::Deleted,
                _ => GroupState::Stopped,
            };
            writer.set(Some(GroupEntry::detached(descriptor)));
            summary.restored.push(group_id);
            if marker == Some(GroupState::Running) {
                to_start.push(group_id);
            }
        }

        for group_id in to_start {
            match self.start(group_id) {
                Ok(()) => summary.started.push(group_id),
                Err(e) => warn!("[qc-18] group {} not restarted: {}", group_id, e),
            }
        }
        info!(
            "[qc-18] restored {} groups, started {}, skipped {}",
            summary.restored.len(),
            summary.started.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Stop every Running group, leaving markers untouched so the next
    /// boot restarts the same set.
    pub fn shutdown(&self) {
        for group_id in self.registry.running_group_ids() {
            let mut writer = self.registry.lock(group_id);
            match self.stop_locked(&mut writer, false) {
                Ok(()) | Err(GroupError::AlreadyStopped(_)) => {}
                Err(e) => error!("[qc-18] group {} failed to stop on shutdown: {}", group_id, e),
            }
        }
        info!("[qc-18] group manager shut down");
    }
}

fn log_outcome<T>(op: &str, raw_id: i64, result: GroupResult<T>) -> GroupResult<T> {
    if let Err(e) = &result {
        if e.is_internal() {
            error!("[qc-18] {} group {} failed: {}", op, raw_id, e);
        } else {
            debug!("[qc-18] {} group {} rejected ({}): {}", op, raw_id, e.status_code(), e);
        }
    }
    result
}

impl GroupLifecycleApi for GroupLifecycleController {
    fn generate_group(&self, group_id: i64, request: &GenerateGroupRequest) -> GroupResult<()> {
        let result = check_group_id(group_id).and_then(|id| self.generate(id, request));
        log_outcome("generate", group_id, result)
    }

    fn start_group(&self, group_id: i64) -> GroupResult<()> {
        let result = check_group_id(group_id).and_then(|id| self.start(id));
        log_outcome("start", group_id, result)
    }

    fn stop_group(&self, group_id: i64) -> GroupResult<()> {
        let result = check_group_id(group_id).and_then(|id| self.stop(id));
        log_outcome("stop", group_id, result)
    }

    fn remove_group(&self, group_id: i64) -> GroupResult<()> {
        let result = check_group_id(group_id).and_then(|id| self.remove(id));
        log_outcome("remove", group_id, result)
    }

    fn recover_group(&self, group_id: i64) -> GroupResult<()> {
        let result = check_group_id(group_id).and_then(|id| self.recover(id));
        log_outcome("recover", group_id, result)
    }

    fn query_group_status(&self, group_id: i64) -> GroupResult<GroupState> {
        let id = check_group_id(group_id)?;
        match self.registry.state(id) {
            GroupState::NotFound => Err(GroupError::NotFound(id)),
            state => Ok(state),
        }
    }
}
