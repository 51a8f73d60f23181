// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{data_file::DataFile, DataFileId};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering::AcqRel, Ordering::Acquire},
        Arc, RwLock,
    },
};

/// Time partition ID
pub type TimePartitionId = i64;

/// Compaction task ID
pub type TaskId = u64;

/// Thread-safe task ID generator
#[derive(Clone, Default, Debug)]
pub struct TaskIdCounter(Arc<AtomicU64>);

impl TaskIdCounter {
    /// Creates a new counter, setting it to some previous value
    #[must_use]
    pub fn new(prev: TaskId) -> Self {
        Self(Arc::new(AtomicU64::new(prev)))
    }

    /// Gets the would-be-next task ID, without incrementing the counter.
    #[must_use]
    pub fn get(&self) -> TaskId {
        self.0.load(Acquire)
    }

    /// Gets the next task ID.
    #[must_use]
    pub fn next(&self) -> TaskId {
        self.0.fetch_add(1, AcqRel)
    }
}

#[derive(Default)]
struct Partition {
    seq: Vec<DataFile>,
    unseq: Vec<DataFile>,
}

impl Partition {
    fn group_mut(&mut self, is_seq: bool) -> &mut Vec<DataFile> {
        if is_seq {
            &mut self.seq
        } else {
            &mut self.unseq
        }
    }
}

/// Tracks the data files of one data region, grouped by time partition
/// and by sequential / unsequential file group
///
/// Files of a group are kept in insertion order, which is the order
/// compaction selection examines them in.
#[derive(Default)]
pub struct FileRegistry {
    partitions: RwLock<BTreeMap<TimePartitionId, Partition>>,
    task_ids: TaskIdCounter,
}

impl std::fmt::Debug for FileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileRegistry(next_task_id={})", self.task_ids.get())
    }
}

impl FileRegistry {
    /// Creates an empty registry handing out task IDs from `task_ids`.
    #[must_use]
    pub fn new(task_ids: TaskIdCounter) -> Self {
        Self {
            partitions: RwLock::default(),
            task_ids,
        }
    }

    /// Appends a file to its partition's sequential or unsequential group.
    pub fn add(&self, partition: TimePartitionId, file: DataFile) {
        let mut partitions = self.partitions.write().expect("lock is poisoned");

        partitions
            .entry(partition)
            .or_default()
            .group_mut(file.is_seq())
            .push(file);
    }

    /// Removes a file, returning it if it was registered.
    pub fn remove(&self, partition: TimePartitionId, id: DataFileId) -> Option<DataFile> {
        let mut partitions = self.partitions.write().expect("lock is poisoned");
        let partition = partitions.get_mut(&partition)?;

        for group in [&mut partition.seq, &mut partition.unseq] {
            if let Some(idx) = group.iter().position(|f| f.id() == id) {
                return Some(group.remove(idx));
            }
        }

        None
    }

    /// Lists all time partitions in ascending order.
    #[must_use]
    pub fn partitions(&self) -> Vec<TimePartitionId> {
        self.partitions
            .read()
            .expect("lock is poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Gets the ordered files of a partition's file group.
    #[must_use]
    pub fn files(&self, partition: TimePartitionId, is_seq: bool) -> Vec<DataFile> {
        let partitions = self.partitions.read().expect("lock is poisoned");

        partitions
            .get(&partition)
            .map(|p| if is_seq { p.seq.clone() } else { p.unseq.clone() })
            .unwrap_or_default()
    }

    /// Returns the total amount of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .expect("lock is poisoned")
            .values()
            .map(|p| p.seq.len() + p.unseq.len())
            .sum()
    }

    /// Returns `true` if no files are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates a new, monotonically increasing compaction task ID.
    #[must_use]
    pub fn next_task_id(&self) -> TaskId {
        self.task_ids.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_index::TimeIndex;
    use test_log::test;

    fn fixture_file(id: DataFileId, is_seq: bool) -> DataFile {
        DataFile::new(
            id,
            format!("/data/{id}-{id}-0-0.tsfile"),
            is_seq,
            100,
            TimeIndex::File { start: 0, end: 1 },
        )
    }

    #[test]
    fn registry_groups_files() {
        let registry = FileRegistry::default();
        registry.add(0, fixture_file(1, true));
        registry.add(0, fixture_file(2, false));
        registry.add(0, fixture_file(3, true));
        registry.add(7, fixture_file(4, true));

        assert_eq!(4, registry.len());
        assert_eq!(vec![0, 7], registry.partitions());

        let seq: Vec<_> = registry.files(0, true).iter().map(DataFile::id).collect();
        assert_eq!(vec![1, 3], seq);

        let unseq: Vec<_> = registry.files(0, false).iter().map(DataFile::id).collect();
        assert_eq!(vec![2], unseq);

        assert!(registry.files(99, true).is_empty());
    }

    #[test]
    fn registry_remove() {
        let registry = FileRegistry::default();
        registry.add(0, fixture_file(1, true));
        registry.add(0, fixture_file(2, false));

        assert_eq!(Some(2), registry.remove(0, 2).map(|f| f.id()));
        assert_eq!(None, registry.remove(0, 2));
        assert_eq!(None, registry.remove(1, 1));
        assert_eq!(1, registry.len());
    }

    #[test]
    fn registry_task_ids_increase() {
        let registry = FileRegistry::new(TaskIdCounter::new(10));
        assert_eq!(10, registry.next_task_id());
        assert_eq!(11, registry.next_task_id());
        assert_eq!(12, registry.next_task_id());
    }
}
