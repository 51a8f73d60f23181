use settle_selector::{
    DataFile, DataFileId, DeviceId, DeviceTimeIndex, DiskSpaceProbe, ModEntry, ScheduleContext,
    StaticDiskSpace, TimeIndex, TimeRange, TtlSource,
};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000_000;
pub const DAY: i64 = 24 * 60 * 60 * 1_000;

#[must_use]
pub fn device_index(devices: &[(&str, i64, i64)]) -> DeviceTimeIndex {
    devices
        .iter()
        .map(|(path, start, end)| (DeviceId::tree(*path), *start, *end))
        .collect()
}

#[must_use]
pub fn data_file(
    id: DataFileId,
    is_seq: bool,
    size: u64,
    devices: &[(&str, i64, i64)],
) -> DataFile {
    DataFile::new(
        id,
        format!("/data/{id}-{id}-0-0.tsfile"),
        is_seq,
        size,
        TimeIndex::Device(Arc::new(device_index(devices))),
    )
}

pub fn delete_all(file: &DataFile, pattern: &str) {
    file.add_mod(ModEntry::tree(pattern, TimeRange::all()));
}

#[must_use]
pub fn context(
    ttl: Arc<dyn TtlSource>,
    disk: Arc<dyn DiskSpaceProbe>,
) -> Arc<ScheduleContext> {
    Arc::new(ScheduleContext::new(ttl, disk))
}

#[must_use]
pub fn default_context() -> Arc<ScheduleContext> {
    context(
        Arc::new(settle_selector::TtlCache::default()),
        Arc::new(StaticDiskSpace::default()),
    )
}
