// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::{Arc, RwLock};

/// Value of [`SettleConfig::max_expired_time`] meaning "no limit"
pub const UNLIMITED_EXPIRED_TIME: i64 = i64::MAX;

/// Settle selection configuration
///
/// A selection pass works on one immutable snapshot of this configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SettleConfig {
    /// Max amount of partially dirty files per task
    pub candidate_file_count: usize,

    /// Max amount of not-reclaimable bytes of the partially dirty files per task
    pub target_file_size: u64,

    /// Deletion size (in bytes) above which a file is picked by the light selection
    pub mods_file_size_threshold: u64,

    /// Minimum fraction of free disk space; below it, any file with deletions
    /// is picked by the light selection
    pub disk_redundancy: f64,

    /// Duration (in ms) after which expired data is considered "expired too long"
    ///
    /// [`UNLIMITED_EXPIRED_TIME`] disables the check.
    pub max_expired_time: i64,

    /// Fraction of deleted devices from which a file counts as partially dirty
    pub expired_data_ratio: f64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            candidate_file_count: 30,
            target_file_size: /* 2 GiB */ 2 * 1_024 * 1_024 * 1_024,
            mods_file_size_threshold: /* 128 KiB */ 128 * 1_024,
            disk_redundancy: 0.05,
            max_expired_time: /* 30 days */ 30 * 24 * 60 * 60 * 1_000,
            expired_data_ratio: 0.3,
        }
    }
}

impl SettleConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the max amount of partially dirty files per task.
    ///
    /// Defaults to 30.
    #[must_use]
    pub fn candidate_file_count(mut self, count: usize) -> Self {
        self.candidate_file_count = count;
        self
    }

    /// Sets the max amount of not-reclaimable bytes per task.
    ///
    /// Defaults to 2 GiB.
    #[must_use]
    pub fn target_file_size(mut self, bytes: u64) -> Self {
        self.target_file_size = bytes;
        self
    }

    /// Sets the deletion size threshold of the light selection.
    ///
    /// Defaults to 128 KiB.
    #[must_use]
    pub fn mods_file_size_threshold(mut self, bytes: u64) -> Self {
        self.mods_file_size_threshold = bytes;
        self
    }

    /// Sets the free disk space fraction under which the light selection
    /// picks any file with deletions.
    ///
    /// Defaults to 5%.
    #[must_use]
    pub fn disk_redundancy(mut self, ratio: f64) -> Self {
        self.disk_redundancy = ratio;
        self
    }

    /// Sets the "expired too long" duration in milliseconds.
    ///
    /// Defaults to 30 days.
    #[must_use]
    pub fn max_expired_time(mut self, millis: i64) -> Self {
        self.max_expired_time = millis;
        self
    }

    /// Sets the deleted device ratio threshold.
    ///
    /// Defaults to 30%.
    #[must_use]
    pub fn expired_data_ratio(mut self, ratio: f64) -> Self {
        self.expired_data_ratio = ratio;
        self
    }

    /// Returns `true` if "expired too long" is a meaningful condition.
    #[must_use]
    pub fn has_max_expired_time(&self) -> bool {
        self.max_expired_time != UNLIMITED_EXPIRED_TIME
    }
}

/// Hot-reloadable handle to the current [`SettleConfig`]
///
/// Readers take cheap snapshots; a reload swaps the whole configuration.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig(Arc<RwLock<Arc<SettleConfig>>>);

impl SharedConfig {
    /// Wraps an initial configuration.
    #[must_use]
    pub fn new(config: SettleConfig) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(config))))
    }

    /// Gets the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SettleConfig> {
        self.0.read().expect("lock is poisoned").clone()
    }

    /// Replaces the configuration; running passes keep their snapshot.
    pub fn reload(&self, config: SettleConfig) {
        log::debug!("Reloading settle config: {config:?}");
        *self.0.write().expect("lock is poisoned") = Arc::new(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn config_snapshot_survives_reload() {
        let shared = SharedConfig::new(SettleConfig::new().candidate_file_count(2));

        let before = shared.snapshot();
        shared.reload(SettleConfig::new().candidate_file_count(5));

        assert_eq!(2, before.candidate_file_count);
        assert_eq!(5, shared.snapshot().candidate_file_count);
    }

    #[test]
    fn config_unlimited_expired_time() {
        assert!(SettleConfig::default().has_max_expired_time());
        assert!(!SettleConfig::default()
            .max_expired_time(UNLIMITED_EXPIRED_TIME)
            .has_max_expired_time());
    }
}
