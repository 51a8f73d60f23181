// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Settle compaction selection
//!
//! A settle compaction rewrites data files to purge data that is expired
//! by TTL or erased by deletions, without merging live data of multiple files.

/// Batching of classified files into settle tasks
pub mod batch;

/// Dirty data classification of single data files
pub mod classifier;
mod schedule;


pub use batch::SettleBatch;
pub use classifier::{Classifier, DirtyStatus, SelectionMode};
pub use schedule::SettleScheduler;

use super::{CompactionSelector, Performer, ScheduleContext};
use crate::{
    config::SettleConfig,
    registry::{FileRegistry, TaskId, TimePartitionId},
    time::{current_time_millis, Timestamp},
    DataFile,
};
use std::sync::Arc;

#[doc(hidden)]
pub const NAME: &str = "SettleCompaction";

/// A settle compaction task, ready to be handed to the compaction executor
#[derive(Debug)]
pub struct SettleTask {
    time_partition: TimePartitionId,
    registry: Arc<FileRegistry>,
    fully_dirty_files: Vec<DataFile>,
    partially_dirty_files: Vec<DataFile>,
    is_seq: bool,
    performer: Performer,
    task_id: TaskId,
}

impl SettleTask {
    /// Gets the task ID.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Gets the time partition the files belong to.
    #[must_use]
    pub fn time_partition(&self) -> TimePartitionId {
        self.time_partition
    }

    /// Gets the registry owning the files.
    #[must_use]
    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    /// Files whose data is dead as a whole, these are simply deleted.
    #[must_use]
    pub fn fully_dirty_files(&self) -> &[DataFile] {
        &self.fully_dirty_files
    }

    /// Files that are rewritten without their dead data.
    #[must_use]
    pub fn partially_dirty_files(&self) -> &[DataFile] {
        &self.partially_dirty_files
    }

    /// Returns `true` if the files belong to the sequential file group.
    #[must_use]
    pub fn is_seq(&self) -> bool {
        self.is_seq
    }

    /// Gets the performer to rewrite the partially dirty files with.
    #[must_use]
    pub fn performer(&self) -> Performer {
        self.performer
    }

    /// Iterates over all selected files, fully dirty files first.
    pub fn selected_files(&self) -> impl Iterator<Item = &DataFile> {
        self.fully_dirty_files
            .iter()
            .chain(&self.partially_dirty_files)
    }

    /// Sum of the sizes of all selected files.
    #[must_use]
    pub fn selected_file_size(&self) -> u64 {
        self.selected_files().map(DataFile::file_size).sum()
    }

    /// Returns `true` if both tasks selected the same files the same way,
    /// ignoring their task IDs.
    #[must_use]
    pub fn same_selection(&self, other: &Self) -> bool {
        self.time_partition == other.time_partition
            && Arc::ptr_eq(&self.registry, &other.registry)
            && self.fully_dirty_files == other.fully_dirty_files
            && self.partially_dirty_files == other.partially_dirty_files
            && self.is_seq == other.is_seq
            && self.performer == other.performer
    }
}

impl std::fmt::Display for SettleTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids = |files: &[DataFile]| files.iter().map(DataFile::id).collect::<Vec<_>>();

        write!(
            f,
            "SettleTask#{}(partition={}, seq={}, fully_dirty={:?}, partially_dirty={:?}, performer={})",
            self.task_id,
            self.time_partition,
            self.is_seq,
            ids(&self.fully_dirty_files),
            ids(&self.partially_dirty_files),
            self.performer,
        )
    }
}

/// Chooses settle tasks from an ordered list of files of one time partition
pub struct SettleSelector {
    mode: SelectionMode,
    storage_group: Arc<str>,
    data_region_id: Arc<str>,
    time_partition: TimePartitionId,
    registry: Arc<FileRegistry>,
    context: Arc<ScheduleContext>,
    config: Arc<SettleConfig>,
    now: Option<Timestamp>,
}

impl SettleSelector {
    /// Creates a selector for one time partition.
    #[must_use]
    pub fn new(
        mode: SelectionMode,
        time_partition: TimePartitionId,
        registry: Arc<FileRegistry>,
        context: Arc<ScheduleContext>,
        config: Arc<SettleConfig>,
    ) -> Self {
        Self {
            mode,
            storage_group: "root".into(),
            data_region_id: "0".into(),
            time_partition,
            registry,
            context,
            config,
            now: None,
        }
    }

    /// Sets the database and data region the files belong to.
    ///
    /// The database scopes the TTLs of table-model devices.
    #[must_use]
    pub fn with_region<S: Into<Arc<str>>>(mut self, storage_group: S, data_region_id: S) -> Self {
        self.storage_group = storage_group.into();
        self.data_region_id = data_region_id.into();
        self
    }

    /// Evaluates TTLs against a fixed time instead of the system clock.
    #[must_use]
    pub fn with_current_time(mut self, now: Timestamp) -> Self {
        self.now = Some(now);
        self
    }

    /// Selects settle tasks from the given files.
    ///
    /// The files need to be ordered and all belong to the same file group.
    /// If any file cannot be examined, no task is returned at all.
    #[must_use]
    pub fn select(&self, files: &[DataFile]) -> Vec<SettleTask> {
        let Some(first) = files.first() else {
            return Vec::new();
        };
        let is_seq = first.is_seq();

        match self.collect_batches(files) {
            Ok(batches) => {
                let tasks = self.create_tasks(batches, is_seq);

                log::debug!(
                    "{}-{} selected {} settle task(s) from {} files in time partition {} ({:?})",
                    self.storage_group,
                    self.data_region_id,
                    tasks.len(),
                    files.len(),
                    self.time_partition,
                    self.mode,
                );

                tasks
            }
            Err(e) => {
                log::error!(
                    "{}-{} cannot select file for settle compaction in time partition {}: {e:?}",
                    self.storage_group,
                    self.data_region_id,
                    self.time_partition,
                );
                Vec::new()
            }
        }
    }

    fn classifier(&self) -> Classifier<'_> {
        Classifier {
            config: &self.config,
            ttl: self.context.ttl.as_ref(),
            disk: self.context.disk.as_ref(),
            storage_group: &self.storage_group,
            now: self.now.unwrap_or_else(current_time_millis),
        }
    }

    fn collect_batches(&self, files: &[DataFile]) -> crate::Result<Vec<SettleBatch>> {
        let classifier = self.classifier();

        let mut batches = Vec::new();
        let mut batch = SettleBatch::default();

        for file in files {
            let status = classifier.classify(file, self.mode)?;
            log::trace!("{file:?} classified as {status:?}");

            if batch.offer(file, status, &self.config) {
                batches.push(std::mem::take(&mut batch));

                // NOTE: The light selection runs often; when the disk is
                // almost full, it should not pick too many files at once
                if self.mode == SelectionMode::Light {
                    break;
                }
            }
        }

        batches.push(batch);

        Ok(batches)
    }

    fn create_tasks(&self, batches: Vec<SettleBatch>, is_seq: bool) -> Vec<SettleTask> {
        batches
            .into_iter()
            .filter(|batch| !batch.is_empty())
            .map(|batch| {
                let (fully_dirty_files, partially_dirty_files) = batch.into_parts();

                SettleTask {
                    time_partition: self.time_partition,
                    registry: self.registry.clone(),
                    fully_dirty_files,
                    partially_dirty_files,
                    is_seq,
                    performer: self.context.performer(is_seq),
                    task_id: self.registry.next_task_id(),
                }
            })
            .collect()
    }
}

impl CompactionSelector for SettleSelector {
    type Task = SettleTask;

    fn get_name(&self) -> &'static str {
        NAME
    }

    fn select(&self, files: &[DataFile]) -> Vec<SettleTask> {
        Self::select(self, files)
    }
}
