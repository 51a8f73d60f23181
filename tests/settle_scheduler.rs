mod common;

use common::{data_file, default_context, delete_all};
use settle_selector::{
    FileRegistry, Performer, SelectionMode, SettleConfig, SettleScheduler, SharedConfig,
    TaskIdCounter,
};
use std::sync::Arc;
use test_log::test;

fn fill(registry: &FileRegistry) {
    let mut id = 0;

    for partition in [2, 0, 1] {
        for is_seq in [false, true] {
            for _ in 0..3 {
                id += 1;

                let d1 = format!("root.sg.f{id}.d1");
                let d2 = format!("root.sg.f{id}.d2");
                let file = data_file(id, is_seq, 100, &[(d1.as_str(), 0, 100), (d2.as_str(), 0, 100)]);
                delete_all(&file, &d1);

                registry.add(partition, file);
            }
        }
    }
}

#[test]
fn scheduler_seq_before_unseq() {
    let registry = Arc::new(FileRegistry::default());
    fill(&registry);

    let scheduler = SettleScheduler::new(
        "root.sg",
        "1",
        registry,
        default_context(),
        SharedConfig::new(SettleConfig::default()),
    );

    let tasks = scheduler.schedule(SelectionMode::Heavy, 1);
    assert_eq!(2, tasks.len());

    let (seq, unseq) = (&tasks[0], &tasks[1]);

    assert!(seq.is_seq());
    assert_eq!(Performer::ReadChunk, seq.performer());
    assert_eq!(3, seq.partially_dirty_files().len());

    assert!(!unseq.is_seq());
    assert_eq!(Performer::Fast, unseq.performer());
    assert!(tasks.iter().all(|t| t.time_partition() == 1));
}

#[test]
fn scheduler_all_partitions_in_order() {
    let registry = Arc::new(FileRegistry::new(TaskIdCounter::new(0)));
    fill(&registry);

    let scheduler = SettleScheduler::new(
        "root.sg",
        "1",
        registry,
        default_context(),
        SharedConfig::new(SettleConfig::default()),
    );

    let tasks = scheduler.schedule_all(SelectionMode::Heavy);

    assert_eq!(
        vec![0, 0, 1, 1, 2, 2],
        tasks.iter().map(|t| t.time_partition()).collect::<Vec<_>>()
    );

    let ids = tasks.iter().map(|t| t.task_id()).collect::<Vec<_>>();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn scheduler_config_reload() {
    let registry = Arc::new(FileRegistry::default());
    fill(&registry);

    let config = SharedConfig::new(SettleConfig::default());

    let scheduler = SettleScheduler::new(
        "root.sg",
        "1",
        registry,
        default_context(),
        config.clone(),
    );

    assert_eq!(2, scheduler.schedule(SelectionMode::Heavy, 0).len());

    config.reload(SettleConfig::default().candidate_file_count(1));
    assert_eq!(6, scheduler.schedule(SelectionMode::Heavy, 0).len());

    config.reload(SettleConfig::default().expired_data_ratio(0.9));
    assert!(scheduler.schedule(SelectionMode::Heavy, 0).is_empty());
}

#[test]
fn scheduler_light_mode() {
    let registry = Arc::new(FileRegistry::default());
    fill(&registry);

    let scheduler = SettleScheduler::new(
        "root.sg",
        "1",
        registry,
        default_context(),
        SharedConfig::new(SettleConfig::default().mods_file_size_threshold(0)),
    );

    // one task per file group at most
    let tasks = scheduler.schedule(SelectionMode::Light, 2);
    assert_eq!(2, tasks.len());
    assert!(tasks.iter().all(|t| t.fully_dirty_files().is_empty()));
}
