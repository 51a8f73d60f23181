// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    config::SettleConfig,
    data_file::{DataFile, FileStatus},
    deletion::is_all_deleted,
    disk::DiskSpaceProbe,
    time::{is_alive, Timestamp},
    ttl::{TtlSource, NO_TTL},
    DeviceId, HashSet,
};

/// How thoroughly files are examined
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum SelectionMode {
    /// Only looks at the size of the attached deletions
    ///
    /// Cheap enough to run on every scheduling round; emits at most one task per pass.
    Light,

    /// Checks the TTL and deletion coverage of every device
    Heavy,
}

/// How much of a file is dead data
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DirtyStatus {
    /// Every device of the file is expired or deleted
    FullyDirty,

    /// Part of the file is dead; `dirty_bytes` estimates the reclaimable bytes
    PartiallyDirty {
        /// Estimated amount of reclaimable bytes, at most the file size
        dirty_bytes: u64,
    },

    /// Not worth settling (which does not mean there is no dead data)
    NotSatisfied,
}

/// Decides how dirty a single file is
pub struct Classifier<'a> {
    /// Configuration snapshot of the current pass
    pub config: &'a SettleConfig,

    /// TTL lookup
    pub ttl: &'a dyn TtlSource,

    /// Free disk space lookup
    pub disk: &'a dyn DiskSpaceProbe,

    /// Database owning table-model devices
    pub storage_group: &'a str,

    /// Current time in milliseconds
    pub now: Timestamp,
}

impl Classifier<'_> {
    /// Classifies a file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the device index of the file needs to be, but cannot be, loaded.
    pub fn classify(&self, file: &DataFile, mode: SelectionMode) -> crate::Result<DirtyStatus> {
        if file.status() != FileStatus::Normal
            || !file.repair_status().is_normal_compaction_candidate()
        {
            return Ok(DirtyStatus::NotSatisfied);
        }

        match mode {
            SelectionMode::Light => Ok(self.classify_by_mod_size(file)),
            SelectionMode::Heavy => self.classify_by_dirty_data(file),
        }
    }

    fn classify_by_mod_size(&self, file: &DataFile) -> DirtyStatus {
        let total_mod_size = file.total_mod_size();

        if total_mod_size == 0 {
            return DirtyStatus::NotSatisfied;
        }

        // NOTE: The light selection does not estimate dirty bytes,
        // the whole file counts as not reclaimable
        if total_mod_size > self.config.mods_file_size_threshold
            || !self.disk.has_space(self.config.disk_redundancy)
        {
            DirtyStatus::PartiallyDirty { dirty_bytes: 0 }
        } else {
            DirtyStatus::NotSatisfied
        }
    }

    fn resolve_ttl(&self, device: &DeviceId) -> i64 {
        if device.is_tree_model() {
            self.ttl.ttl_for_tree(device)
        } else {
            self.ttl.ttl_for_table(self.storage_group, device.table_name())
        }
    }

    /// A file is only selected if all of its devices that have a TTL are dead.
    ///
    /// On top of that, the deleted device ratio needs to reach the threshold, or
    /// some device needs to be expired for too long.
    #[allow(clippy::float_cmp)]
    fn classify_by_dirty_data(&self, file: &DataFile) -> crate::Result<DirtyStatus> {
        let index = file.device_time_index()?;

        if index.is_empty() {
            return Ok(DirtyStatus::NotSatisfied);
        }

        let mods = file.mods();

        let mut deleted_devices: HashSet<&DeviceId> = HashSet::default();
        let mut has_expired_too_long = false;

        for (device, start, end) in index.iter() {
            let ttl = self.resolve_ttl(device);
            let has_ttl = ttl != NO_TTL;

            let is_deleted =
                !is_alive(end, ttl, self.now) || is_all_deleted(&mods, device, start, end);

            if has_ttl {
                if !is_deleted {
                    // Devices with a TTL need to be completely dead for the file to be picked
                    return Ok(DirtyStatus::NotSatisfied);
                }

                if !has_expired_too_long {
                    let outdated_time_diff = self.now.saturating_sub(end);
                    let ttl_threshold = ttl.checked_mul(3).unwrap_or(i64::MAX);

                    has_expired_too_long =
                        outdated_time_diff > self.config.max_expired_time.min(ttl_threshold);
                }
            }

            if is_deleted {
                deleted_devices.insert(device);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let deleted_ratio = deleted_devices.len() as f64 / index.len() as f64;

        if deleted_ratio == 1.0 {
            return Ok(DirtyStatus::FullyDirty);
        }

        let has_expired_too_long = self.config.has_max_expired_time() && has_expired_too_long;

        if has_expired_too_long || deleted_ratio >= self.config.expired_data_ratio {
            let file_size = file.file_size();

            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let dirty_bytes = ((deleted_ratio * file_size as f64).round() as u64).min(file_size);

            return Ok(DirtyStatus::PartiallyDirty { dirty_bytes });
        }

        Ok(DirtyStatus::NotSatisfied)
    }
}
