// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::{AtomicU64, Ordering};

/// Reports whether the data disks still have room
pub trait DiskSpaceProbe: Send + Sync {
    /// Returns `true` if the available fraction of disk space is above `redundancy`.
    fn has_space(&self, redundancy: f64) -> bool;
}

/// Disk probe that reports a settable available-space ratio
///
/// The storage engine refreshes the ratio from its periodic disk usage scan.
#[derive(Debug)]
pub struct StaticDiskSpace(AtomicU64);

impl StaticDiskSpace {
    /// Creates a probe reporting `available_ratio` (0.0 ..= 1.0) free space.
    #[must_use]
    pub fn new(available_ratio: f64) -> Self {
        Self(AtomicU64::new(available_ratio.to_bits()))
    }

    /// Updates the available-space ratio.
    pub fn set_available_ratio(&self, available_ratio: f64) {
        self.0.store(available_ratio.to_bits(), Ordering::Release);
    }

    /// Gets the available-space ratio.
    #[must_use]
    pub fn available_ratio(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

impl Default for StaticDiskSpace {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl DiskSpaceProbe for StaticDiskSpace {
    fn has_space(&self, redundancy: f64) -> bool {
        self.available_ratio() > redundancy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn disk_space_threshold() {
        let probe = StaticDiskSpace::new(0.2);
        assert!(probe.has_space(0.05));
        assert!(!probe.has_space(0.2));

        probe.set_available_ratio(0.01);
        assert!(!probe.has_space(0.05));
    }
}
