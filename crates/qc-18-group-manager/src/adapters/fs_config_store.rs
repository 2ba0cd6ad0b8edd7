//! # Filesystem Config Store
//!
//! Layout:
//!
//! ```text
//! <conf_dir>/group.<id>.genesis     TOML GenesisConfig
//! <conf_dir>/group.<id>.ini         TOML GroupConfig
//! <data_dir>/group<id>/.group_status  STOPPED | RUNNING | DELETED
//! ```
//!
//! Configuration files are created exclusively so two writers can never
//! overwrite each other. The status marker is replaced atomically through a
//! temp file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::domain::{GenesisConfig, GroupConfig, GroupId, GroupState, StoreError};
use crate::ports::{ConfigStore, GroupFile};

const GENESIS_SUFFIX: &str = ".genesis";
const GROUP_CONFIG_SUFFIX: &str = ".ini";
const STATUS_FILE: &str = ".group_status";

/// Group files on local disk.
#[derive(Clone, Debug)]
pub struct FsConfigStore {
    conf_dir: PathBuf,
    data_dir: PathBuf,
}

impl FsConfigStore {
    /// Store under `conf_dir` / `data_dir`; directories are created lazily.
    pub fn new(conf_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            conf_dir: conf_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Path of the genesis file.
    pub fn genesis_path(&self, group_id: GroupId) -> PathBuf {
        self.conf_dir
            .join(format!("group.{}{}", group_id, GENESIS_SUFFIX))
    }

    /// Path of the group config file.
    pub fn group_config_path(&self, group_id: GroupId) -> PathBuf {
        self.conf_dir
            .join(format!("group.{}{}", group_id, GROUP_CONFIG_SUFFIX))
    }

    /// Path of the status marker.
    pub fn status_path(&self, group_id: GroupId) -> PathBuf {
        self.data_dir
            .join(format!("group{}", group_id))
            .join(STATUS_FILE)
    }

    fn create_exclusive<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let body = toml::to_string_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
        ensure_parent(path)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(path.display().to_string()))
            }
            Err(e) => return Err(io_error(path, e)),
        };
        file.write_all(body.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| io_error(path, e))?;
        debug!("[qc-18] wrote {}", path.display());
        Ok(())
    }

    fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Parse {
                path: path.display().to_string(),
                error: e.to_string(),
            })
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    }
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| io_error(parent, e)),
        None => Ok(()),
    }
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}

impl ConfigStore for FsConfigStore {
    fn genesis_exists(&self, group_id: GroupId) -> bool {
        self.genesis_path(group_id).exists()
    }

    fn group_config_exists(&self, group_id: GroupId) -> bool {
        self.group_config_path(group_id).exists()
    }

    fn write_genesis(&self, group_id: GroupId, genesis: &GenesisConfig) -> Result<(), StoreError> {
        Self::create_exclusive(&self.genesis_path(group_id), genesis)
    }

    fn write_group_config(
        &self,
        group_id: GroupId,
        config: &GroupConfig,
    ) -> Result<(), StoreError> {
        Self::create_exclusive(&self.group_config_path(group_id), config)
    }

    fn read_genesis(&self, group_id: GroupId) -> Result<Option<GenesisConfig>, StoreError> {
        Self::read_toml(&self.genesis_path(group_id))
    }

    fn read_group_config(&self, group_id: GroupId) -> Result<Option<GroupConfig>, StoreError> {
        Self::read_toml(&self.group_config_path(group_id))
    }

    fn remove_group_files(
        &self,
        group_id: GroupId,
        files: &[GroupFile],
    ) -> Result<(), StoreError> {
        for file in files {
            let path = match file {
                GroupFile::Genesis => self.genesis_path(group_id),
                GroupFile::GroupConfig => self.group_config_path(group_id),
                GroupFile::Status => self.status_path(group_id),
            };
            remove_if_present(&path)?;
        }
        Ok(())
    }

    fn write_status(&self, group_id: GroupId, state: GroupState) -> Result<(), StoreError> {
        let path = self.status_path(group_id);
        ensure_parent(&path)?;

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
        file.write_all(state.as_str().as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| io_error(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| io_error(&path, e))
    }

    fn read_status(&self, group_id: GroupId) -> Result<Option<GroupState>, StoreError> {
        let path = self.status_path(group_id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        text.parse::<GroupState>()
            .map(Some)
            .map_err(|error| StoreError::Parse {
                path: path.display().to_string(),
                error,
            })
    }

    fn list_groups(&self) -> Result<Vec<GroupId>, StoreError> {
        let entries = match fs::read_dir(&self.conf_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.conf_dir, e)),
        };

        let mut ids: Vec<GroupId> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_prefix("group.")?
                    .strip_suffix(GENESIS_SUFFIX)?
                    .parse::<GroupId>()
                    .ok()
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
