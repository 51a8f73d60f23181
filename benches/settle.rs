use criterion::{criterion_group, criterion_main, Criterion};
use settle_selector::{
    deletion::is_all_deleted, DataFile, DeviceId, DeviceTimeIndex, FileRegistry, ModEntry,
    ScheduleContext, SelectionMode, SettleConfig, SettleSelector, StaticDiskSpace, TimeIndex,
    TimeRange, TtlCache,
};
use std::sync::Arc;

fn fixture_files(file_count: u64, device_count: u64) -> Vec<DataFile> {
    (0..file_count)
        .map(|id| {
            let index: DeviceTimeIndex = (0..device_count)
                .map(|d| (DeviceId::tree(format!("root.sg.d{d}")), 0, 1_000))
                .collect();

            let file = DataFile::new(
                id,
                format!("/data/{id}-{id}-0-0.tsfile"),
                true,
                1_000_000,
                TimeIndex::Device(Arc::new(index)),
            );

            for d in (0..device_count).step_by(2) {
                file.add_mod(ModEntry::tree(
                    format!("root.sg.d{d}").as_str(),
                    TimeRange::new(0, 1_000),
                ));
            }

            file
        })
        .collect()
}

fn select(c: &mut Criterion) {
    let mut group = c.benchmark_group("SettleSelector::select");

    let context = Arc::new(ScheduleContext::new(
        Arc::new(TtlCache::default()),
        Arc::new(StaticDiskSpace::default()),
    ));

    for mode in [SelectionMode::Light, SelectionMode::Heavy] {
        for (file_count, device_count) in [(100, 10), (100, 100), (1_000, 10)] {
            let files = fixture_files(file_count, device_count);

            let selector = SettleSelector::new(
                mode,
                0,
                Arc::new(FileRegistry::default()),
                context.clone(),
                Arc::new(SettleConfig::default().mods_file_size_threshold(0)),
            )
            .with_current_time(1_000_000);

            group.bench_function(
                format!("{mode:?} {file_count} files x {device_count} devices"),
                |b| {
                    b.iter(|| selector.select(&files));
                },
            );
        }
    }
}

fn deletion_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_all_deleted");

    let device = DeviceId::tree("root.sg.d1");

    for mod_count in [1, 10, 100, 1_000] {
        let mods: Vec<_> = (0..mod_count)
            .map(|i| ModEntry::tree("root.sg.*", TimeRange::new(i * 10, i * 10 + 10)))
            .collect();

        group.bench_function(format!("{mod_count} adjacent deletions"), |b| {
            b.iter(|| is_all_deleted(&mods, &device, 0, mod_count * 10));
        });
    }
}

criterion_group!(benches, select, deletion_coverage);
criterion_main!(benches);
