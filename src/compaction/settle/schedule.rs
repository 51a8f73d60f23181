// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{SelectionMode, SettleSelector, SettleTask};
use crate::{
    compaction::ScheduleContext,
    config::SharedConfig,
    registry::{FileRegistry, TimePartitionId},
};
use std::sync::Arc;

/// Runs settle selection over the time partitions of one data region
pub struct SettleScheduler {
    storage_group: Arc<str>,
    data_region_id: Arc<str>,
    registry: Arc<FileRegistry>,
    context: Arc<ScheduleContext>,
    config: SharedConfig,
}

impl SettleScheduler {
    /// Creates a scheduler for a data region.
    #[must_use]
    pub fn new<S: Into<Arc<str>>>(
        storage_group: S,
        data_region_id: S,
        registry: Arc<FileRegistry>,
        context: Arc<ScheduleContext>,
        config: SharedConfig,
    ) -> Self {
        Self {
            storage_group: storage_group.into(),
            data_region_id: data_region_id.into(),
            registry,
            context,
            config,
        }
    }

    /// Selects settle tasks of a time partition, sequential files first.
    ///
    /// Both file groups are examined with the same configuration snapshot.
    #[must_use]
    pub fn schedule(&self, mode: SelectionMode, partition: TimePartitionId) -> Vec<SettleTask> {
        let selector = SettleSelector::new(
            mode,
            partition,
            self.registry.clone(),
            self.context.clone(),
            self.config.snapshot(),
        )
        .with_region(self.storage_group.clone(), self.data_region_id.clone());

        let mut tasks = selector.select(&self.registry.files(partition, true));
        tasks.extend(selector.select(&self.registry.files(partition, false)));
        tasks
    }

    /// Selects settle tasks of every time partition, in ascending partition order.
    #[must_use]
    pub fn schedule_all(&self, mode: SelectionMode) -> Vec<SettleTask> {
        let tasks: Vec<_> = self
            .registry
            .partitions()
            .into_iter()
            .flat_map(|partition| self.schedule(mode, partition))
            .collect();

        if !tasks.is_empty() {
            log::info!(
                "{}-{} scheduled {} settle task(s)",
                self.storage_group,
                self.data_region_id,
                tasks.len(),
            );
        }

        tasks
    }
}
