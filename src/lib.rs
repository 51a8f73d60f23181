// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Candidate selection for settle compactions of a time-series storage engine.
//!
//! ##### NOTE
//!
//! > This crate only decides *which* data files should be settled.
//! > Rewriting the files, and the scheduling loop that runs the selection
//! > periodically, are left to the storage engine.
//!
//! ##### About
//!
//! Time-series data dies in two ways: it expires by TTL, or it is erased by deletions
//! that are stored next to the data file as modification entries.
//! Dead data is only physically removed when the file is rewritten.
//!
//! A settle compaction rewrites single files (instead of merging multiple files),
//! dropping files that are dead as a whole and rewriting files that are partially dead.
//!
//! Selection runs in two modes:
//!
//! - `Light`: cheap, only looks at the size of the stored deletions (and the free disk space)
//! - `Heavy`: checks the TTL and deletion coverage of every device of a file
//!
//! Files are examined in order and grouped into batches; each non-empty batch
//! becomes a settle task.
//!
//! ```
//! use settle_selector::{
//!     compaction::{ScheduleContext, SelectionMode, SettleSelector},
//!     DataFile, DeviceId, DeviceTimeIndex, FileRegistry, ModEntry,
//!     SettleConfig, StaticDiskSpace, TimeIndex, TimeRange, TtlCache,
//! };
//! use std::sync::Arc;
//!
//! let index: DeviceTimeIndex = [(DeviceId::tree("root.sg.d1"), 0, 100)].into_iter().collect();
//! let file = DataFile::new(1, "/data/1-1-0-0.tsfile", true, 1_000, TimeIndex::Device(Arc::new(index)));
//! file.add_mod(ModEntry::tree("root.sg.**", TimeRange::all()));
//!
//! let context = ScheduleContext::new(
//!     Arc::new(TtlCache::default()),
//!     Arc::new(StaticDiskSpace::default()),
//! );
//!
//! let selector = SettleSelector::new(
//!     SelectionMode::Heavy,
//!     0,
//!     Arc::new(FileRegistry::default()),
//!     Arc::new(context),
//!     Arc::new(SettleConfig::default()),
//! );
//!
//! let tasks = selector.select(&[file]);
//! assert_eq!(1, tasks.len());
//! assert_eq!(1, tasks[0].fully_dirty_files().len());
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

pub(crate) type HashSet<K> = std::collections::HashSet<K, rustc_hash::FxBuildHasher>;

#[doc(hidden)]
pub mod coding;

pub mod compaction;

/// Configuration
pub mod config;

mod data_file;

/// Deletions (modification entries) attached to data files
pub mod deletion;

mod device;

/// Free disk space lookup
pub mod disk;

mod error;

#[doc(hidden)]
pub mod file;

mod pattern;
mod registry;

/// Time utilities
pub mod time;

mod time_index;

/// TTL rules
pub mod ttl;

pub use {
    compaction::{
        CompactionSelector, Performer, ScheduleContext, SelectionMode, SettleScheduler,
        SettleSelector, SettleTask,
    },
    config::{SettleConfig, SharedConfig, UNLIMITED_EXPIRED_TIME},
    data_file::{DataFile, DataFileId, FileStatus, RepairStatus},
    deletion::{DeletionTarget, ModEntry, TimeRange},
    device::DeviceId,
    disk::{DiskSpaceProbe, StaticDiskSpace},
    error::{Error, Result},
    pattern::PathPattern,
    registry::{FileRegistry, TaskId, TaskIdCounter, TimePartitionId},
    time::Timestamp,
    time_index::{DeviceTimeIndex, TimeIndex},
    ttl::{TtlCache, TtlSource, NO_TTL},
};

#[doc(hidden)]
#[must_use]
#[allow(missing_docs, clippy::missing_errors_doc, clippy::unwrap_used)]
pub fn get_tmp_folder() -> tempfile::TempDir {
    if let Ok(p) = std::env::var("SETTLE_TMP_FOLDER") {
        tempfile::tempdir_in(p)
    } else {
        tempfile::tempdir()
    }
    .unwrap()
}
