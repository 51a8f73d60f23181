// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::classifier::DirtyStatus;
use crate::{config::SettleConfig, DataFile};

/// Files accumulated for one settle task
#[derive(Debug, Default)]
pub struct SettleBatch {
    fully_dirty: Vec<DataFile>,
    partially_dirty: Vec<DataFile>,

    /// Bytes of the partially dirty files that survive the settle
    clean_bytes: u64,
}

impl SettleBatch {
    /// Adds a classified file to the batch.
    ///
    /// Returns `true` if the batch should be closed.
    pub fn offer(&mut self, file: &DataFile, status: DirtyStatus, config: &SettleConfig) -> bool {
        match status {
            DirtyStatus::FullyDirty => {
                self.fully_dirty.push(file.clone());
                false
            }
            DirtyStatus::PartiallyDirty { dirty_bytes } => {
                self.partially_dirty.push(file.clone());
                self.clean_bytes = self
                    .clean_bytes
                    .saturating_add(file.file_size().saturating_sub(dirty_bytes));
                self.is_full(config)
            }
            // A file that is not picked breaks the run of partially dirty files
            DirtyStatus::NotSatisfied => !self.partially_dirty.is_empty(),
        }
    }

    /// Returns `true` if the file count or clean byte limit is reached.
    #[must_use]
    pub fn is_full(&self, config: &SettleConfig) -> bool {
        self.partially_dirty.len() >= config.candidate_file_count
            || self.clean_bytes >= config.target_file_size
    }

    /// Returns `true` if the batch has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fully_dirty.is_empty() && self.partially_dirty.is_empty()
    }

    /// Files that are dropped as a whole.
    #[must_use]
    pub fn fully_dirty(&self) -> &[DataFile] {
        &self.fully_dirty
    }

    /// Files that are rewritten.
    #[must_use]
    pub fn partially_dirty(&self) -> &[DataFile] {
        &self.partially_dirty
    }

    /// Bytes of the partially dirty files that survive the settle.
    #[must_use]
    pub fn clean_bytes(&self) -> u64 {
        self.clean_bytes
    }

    pub(crate) fn into_parts(self) -> (Vec<DataFile>, Vec<DataFile>) {
        (self.fully_dirty, self.partially_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_index::TimeIndex;
    use test_log::test;

    fn fixture_file(id: u64, size: u64) -> DataFile {
        DataFile::new(
            id,
            format!("/data/{id}-{id}-0-0.tsfile"),
            true,
            size,
            TimeIndex::File { start: 0, end: 1 },
        )
    }

    #[test]
    fn batch_fully_dirty_never_closes() {
        let config = SettleConfig::default()
            .candidate_file_count(1)
            .target_file_size(1);
        let mut batch = SettleBatch::default();

        for id in 0..10 {
            assert!(!batch.offer(&fixture_file(id, 1_000), DirtyStatus::FullyDirty, &config));
        }

        assert_eq!(10, batch.fully_dirty().len());
        assert_eq!(0, batch.clean_bytes());
    }

    #[test]
    fn batch_closes_on_count() {
        let config = SettleConfig::default().candidate_file_count(2);
        let mut batch = SettleBatch::default();
        let status = DirtyStatus::PartiallyDirty { dirty_bytes: 10 };

        assert!(!batch.offer(&fixture_file(1, 100), status, &config));
        assert!(batch.offer(&fixture_file(2, 100), status, &config));
        assert_eq!(180, batch.clean_bytes());
    }

    #[test]
    fn batch_closes_on_clean_bytes() {
        let config = SettleConfig::default().target_file_size(150);
        let mut batch = SettleBatch::default();

        assert!(!batch.offer(
            &fixture_file(1, 100),
            DirtyStatus::PartiallyDirty { dirty_bytes: 50 },
            &config
        ));
        assert!(!batch.offer(&fixture_file(2, 1_000), DirtyStatus::FullyDirty, &config));
        assert!(batch.offer(
            &fixture_file(3, 100),
            DirtyStatus::PartiallyDirty { dirty_bytes: 0 },
            &config
        ));
        assert_eq!(150, batch.clean_bytes());
    }

    #[test]
    fn batch_not_satisfied_breaks_run() {
        let config = SettleConfig::default();
        let mut batch = SettleBatch::default();

        assert!(!batch.offer(&fixture_file(1, 100), DirtyStatus::NotSatisfied, &config));
        assert!(!batch.offer(&fixture_file(2, 100), DirtyStatus::FullyDirty, &config));
        assert!(!batch.offer(&fixture_file(3, 100), DirtyStatus::NotSatisfied, &config));

        assert!(!batch.offer(
            &fixture_file(4, 100),
            DirtyStatus::PartiallyDirty { dirty_bytes: 0 },
            &config
        ));
        assert!(batch.offer(&fixture_file(5, 100), DirtyStatus::NotSatisfied, &config));

        let (fully, partially) = batch.into_parts();
        assert_eq!(vec![2], fully.iter().map(DataFile::id).collect::<Vec<_>>());
        assert_eq!(vec![4], partially.iter().map(DataFile::id).collect::<Vec<_>>());
    }

    #[test]
    fn batch_empty() {
        let mut batch = SettleBatch::default();
        assert!(batch.is_empty());

        batch.offer(
            &fixture_file(1, 100),
            DirtyStatus::NotSatisfied,
            &SettleConfig::default(),
        );
        assert!(batch.is_empty());
    }
}
