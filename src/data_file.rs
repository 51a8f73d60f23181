// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    deletion::ModEntry,
    time_index::{DeviceTimeIndex, TimeIndex},
};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

/// Unique data file ID
pub type DataFileId = u64;

/// Lifecycle status of a data file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum FileStatus {
    /// Still being written to
    Unclosed,

    /// Closed and readable, may be compacted
    Normal,

    /// Picked as a compaction candidate
    CompactionCandidate,

    /// Being compacted
    Compacting,

    /// Scheduled for removal
    Deleted,
}

/// Result of the data file consistency check
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum RepairStatus {
    /// Checked and fine
    Normal,

    /// Not yet checked
    NeedToCheck,

    /// Overlaps with other sequential files and needs a rewrite
    NeedToRepair,

    /// Broken beyond repair
    CanNotRepair,
}

impl RepairStatus {
    /// Returns `true` if the file may take part in ordinary compactions.
    #[must_use]
    pub fn is_normal_compaction_candidate(self) -> bool {
        matches!(self, Self::Normal | Self::NeedToCheck)
    }
}

struct DataFileInner {
    id: DataFileId,
    path: PathBuf,
    is_seq: bool,
    file_size: u64,

    status: RwLock<FileStatus>,
    repair_status: RwLock<RepairStatus>,
    time_index: RwLock<TimeIndex>,

    mods: RwLock<Vec<ModEntry>>,
    total_mod_size: AtomicU64,
}

/// A data file, as tracked by the storage engine
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct DataFile(Arc<DataFileInner>);

impl std::fmt::Debug for DataFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataFile#{}({})", self.id(), self.path().display())
    }
}

impl PartialEq for DataFile {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for DataFile {}

impl DataFile {
    /// Registers a closed data file.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(
        id: DataFileId,
        path: P,
        is_seq: bool,
        file_size: u64,
        time_index: TimeIndex,
    ) -> Self {
        Self(Arc::new(DataFileInner {
            id,
            path: path.into(),
            is_seq,
            file_size,
            status: RwLock::new(FileStatus::Normal),
            repair_status: RwLock::new(RepairStatus::Normal),
            time_index: RwLock::new(time_index),
            mods: RwLock::default(),
            total_mod_size: AtomicU64::default(),
        }))
    }

    /// Gets the file ID.
    #[must_use]
    pub fn id(&self) -> DataFileId {
        self.0.id
    }

    /// Gets the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }

    /// Returns `true` if the file belongs to the sequential file group.
    #[must_use]
    pub fn is_seq(&self) -> bool {
        self.0.is_seq
    }

    /// Gets the on-disk size in bytes.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.0.file_size
    }

    /// Gets the lifecycle status.
    #[must_use]
    pub fn status(&self) -> FileStatus {
        *self.0.status.read().expect("lock is poisoned")
    }

    /// Sets the lifecycle status.
    pub fn set_status(&self, status: FileStatus) {
        *self.0.status.write().expect("lock is poisoned") = status;
    }

    /// Gets the consistency check result.
    #[must_use]
    pub fn repair_status(&self) -> RepairStatus {
        *self.0.repair_status.read().expect("lock is poisoned")
    }

    /// Sets the consistency check result.
    pub fn set_repair_status(&self, status: RepairStatus) {
        *self.0.repair_status.write().expect("lock is poisoned") = status;
    }

    /// Gets a snapshot of the time index.
    #[must_use]
    pub fn time_index(&self) -> TimeIndex {
        self.0.time_index.read().expect("lock is poisoned").clone()
    }

    /// Replaces the in-memory time index.
    pub fn set_time_index(&self, time_index: TimeIndex) {
        *self.0.time_index.write().expect("lock is poisoned") = time_index;
    }

    /// Gets the per-device time index, loading it from disk if only a coarse
    /// index is kept in memory.
    ///
    /// The loaded index is not cached in the file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the sidecar index file cannot be read.
    pub fn device_time_index(&self) -> crate::Result<Arc<DeviceTimeIndex>> {
        self.time_index().device_index(self.path())
    }

    /// Attaches a deletion to the file.
    pub fn add_mod(&self, entry: ModEntry) {
        let size = entry.serialized_size();

        let mut mods = self.0.mods.write().expect("lock is poisoned");
        mods.push(entry);

        self.0.total_mod_size.fetch_add(size, Ordering::AcqRel);
    }

    /// Gets a snapshot of all deletions attached to the file.
    #[must_use]
    pub fn mods(&self) -> Vec<ModEntry> {
        self.0.mods.read().expect("lock is poisoned").clone()
    }

    /// Gets the serialized size of all attached deletions in bytes.
    #[must_use]
    pub fn total_mod_size(&self) -> u64 {
        self.0.total_mod_size.load(Ordering::Acquire)
    }
}
