// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Contains compaction selectors

pub mod settle;

pub use settle::{SelectionMode, SettleScheduler, SettleSelector, SettleTask};

use crate::{disk::DiskSpaceProbe, ttl::TtlSource, DataFile};
use std::sync::Arc;

/// Algorithm used to rewrite the files of a compaction task
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Performer {
    /// Rewrites chunk by chunk, only decoding chunks that need it
    ReadChunk,

    /// Merges pages where possible, falling back to points
    Fast,

    /// Reads and rewrites every point
    ReadPoint,
}

impl std::fmt::Display for Performer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::ReadChunk => "read_chunk",
                Self::Fast => "fast",
                Self::ReadPoint => "read_point",
            }
        )
    }
}

/// Shared collaborators of one scheduling round
pub struct ScheduleContext {
    /// Performer attached to tasks over sequential files
    pub seq_performer: Performer,

    /// Performer attached to tasks over unsequential files
    pub unseq_performer: Performer,

    /// TTL lookup
    pub ttl: Arc<dyn TtlSource>,

    /// Free disk space lookup
    pub disk: Arc<dyn DiskSpaceProbe>,
}

impl std::fmt::Debug for ScheduleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ScheduleContext(seq={}, unseq={})",
            self.seq_performer, self.unseq_performer
        )
    }
}

impl ScheduleContext {
    /// Creates a context using the default performers
    /// ([`Performer::ReadChunk`] for sequential, [`Performer::Fast`] for unsequential files).
    #[must_use]
    pub fn new(ttl: Arc<dyn TtlSource>, disk: Arc<dyn DiskSpaceProbe>) -> Self {
        Self {
            seq_performer: Performer::ReadChunk,
            unseq_performer: Performer::Fast,
            ttl,
            disk,
        }
    }

    /// Sets the performer of sequential tasks.
    #[must_use]
    pub fn with_seq_performer(mut self, performer: Performer) -> Self {
        self.seq_performer = performer;
        self
    }

    /// Sets the performer of unsequential tasks.
    #[must_use]
    pub fn with_unseq_performer(mut self, performer: Performer) -> Self {
        self.unseq_performer = performer;
        self
    }

    /// Chooses the performer for a file group.
    #[must_use]
    pub fn performer(&self, is_seq: bool) -> Performer {
        if is_seq {
            self.seq_performer
        } else {
            self.unseq_performer
        }
    }
}

/// Trait for a compaction selector
///
/// The selector receives an ordered list of files of one file group
/// and emits the tasks to run.
#[allow(clippy::module_name_repetitions)]
pub trait CompactionSelector {
    /// Task emitted by the selector
    type Task;

    /// Gets the selector name.
    fn get_name(&self) -> &'static str;

    /// Chooses tasks from the given files.
    fn select(&self, files: &[DataFile]) -> Vec<Self::Task>;
}
