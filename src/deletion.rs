// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{read_str, write_str, Decode, DecodeError, Encode, EncodeError},
    pattern::PathPattern,
    time::Timestamp,
    DeviceId,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::{
    io::{Read, Write},
    sync::Arc,
};

const TAG_TREE: u8 = 0;
const TAG_TABLE_ALL: u8 = 1;
const TAG_TABLE_DEVICE: u8 = 2;

/// An inclusive time range `[min, max]`
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct TimeRange {
    /// Inclusive lower bound
    pub min: Timestamp,

    /// Inclusive upper bound
    pub max: Timestamp,
}

impl TimeRange {
    /// Creates a new time range.
    #[must_use]
    pub fn new(min: Timestamp, max: Timestamp) -> Self {
        debug_assert!(min <= max, "time range min must be <= max");
        Self { min, max }
    }

    /// Covers every representable timestamp.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Timestamp::MIN, Timestamp::MAX)
    }

    /// Returns `true` if `[start, end]` lies completely inside this range.
    #[must_use]
    pub fn contains(&self, start: Timestamp, end: Timestamp) -> bool {
        self.min <= start && end <= self.max
    }
}

/// What a deletion applies to
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeletionTarget {
    /// Tree-model devices matching the pattern, or whose series all match it (`root.sg.d1.**`)
    Tree(PathPattern),

    /// All devices of a table
    Table(Arc<str>),

    /// A single table-model device
    TableDevice(DeviceId),
}

/// A stored deletion predicate, attached to a data file
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModEntry {
    /// Affected devices
    pub target: DeletionTarget,

    /// Deleted time range
    pub range: TimeRange,
}

impl ModEntry {
    /// Deletes matching tree-model devices in the given time range.
    #[must_use]
    pub fn tree<P: Into<PathPattern>>(pattern: P, range: TimeRange) -> Self {
        Self {
            target: DeletionTarget::Tree(pattern.into()),
            range,
        }
    }

    /// Deletes all devices of a table in the given time range.
    #[must_use]
    pub fn table<S: Into<Arc<str>>>(table: S, range: TimeRange) -> Self {
        Self {
            target: DeletionTarget::Table(table.into()),
            range,
        }
    }

    /// Deletes a single table-model device in the given time range.
    #[must_use]
    pub fn table_device(device: DeviceId, range: TimeRange) -> Self {
        Self {
            target: DeletionTarget::TableDevice(device),
            range,
        }
    }

    /// Returns `true` if the deletion applies to every measurement of `device`.
    #[must_use]
    pub fn affects(&self, device: &DeviceId) -> bool {
        match (&self.target, device) {
            (DeletionTarget::Tree(pattern), DeviceId::Tree(path)) => pattern.covers_device(path),
            (DeletionTarget::Table(table), DeviceId::Table { table: t, .. }) => table == t,
            (DeletionTarget::TableDevice(target), _) => target == device,
            _ => false,
        }
    }

    /// Size of the serialized entry, as accounted in the modification file.
    #[must_use]
    pub fn serialized_size(&self) -> u64 {
        self.encode_into_vec().len() as u64
    }
}

impl Encode for ModEntry {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        match &self.target {
            DeletionTarget::Tree(pattern) => {
                writer.write_u8(TAG_TREE)?;
                write_str(writer, pattern.as_str())?;
            }
            DeletionTarget::Table(table) => {
                writer.write_u8(TAG_TABLE_ALL)?;
                write_str(writer, table)?;
            }
            DeletionTarget::TableDevice(device) => {
                writer.write_u8(TAG_TABLE_DEVICE)?;
                device.encode_into(writer)?;
            }
        }

        writer.write_i64::<BigEndian>(self.range.min)?;
        writer.write_i64::<BigEndian>(self.range.max)?;

        Ok(())
    }
}

impl Decode for ModEntry {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let target = match reader.read_u8()? {
            TAG_TREE => DeletionTarget::Tree(PathPattern::new(read_str(reader)?)),
            TAG_TABLE_ALL => DeletionTarget::Table(read_str(reader)?.into()),
            TAG_TABLE_DEVICE => DeletionTarget::TableDevice(DeviceId::decode_from(reader)?),
            tag => return Err(DecodeError::InvalidTag(("ModEntry", tag))),
        };

        let min = reader.read_i64::<BigEndian>()?;
        let max = reader.read_i64::<BigEndian>()?;

        if min > max {
            return Err(DecodeError::InvalidHeader("ModEntry"));
        }

        Ok(Self {
            target,
            range: TimeRange { min, max },
        })
    }
}

/// Returns `true` if the data of `device` in `[start, end]` is completely
/// deleted by the given modifications.
///
/// The time ranges of all deletions affecting the device are unioned,
/// so a range may be covered by multiple adjacent or overlapping deletions.
#[must_use]
pub fn is_all_deleted<'a>(
    mods: impl IntoIterator<Item = &'a ModEntry>,
    device: &DeviceId,
    start: Timestamp,
    end: Timestamp,
) -> bool {
    let mut ranges: Vec<TimeRange> = mods
        .into_iter()
        .filter(|m| m.affects(device))
        .map(|m| m.range)
        .filter(|r| r.max >= start && r.min <= end)
        .collect();

    if ranges.is_empty() {
        return false;
    }

    ranges.sort_unstable_by_key(|r| r.min);

    // Sweep from `start` and try to reach `end` without a gap
    let mut covered_until = start;

    for range in ranges {
        if range.min > covered_until {
            return false;
        }

        if range.max >= end {
            return true;
        }

        // NOTE: range.max < end <= i64::MAX, so this cannot overflow
        covered_until = covered_until.max(range.max + 1);
    }

    false
}
