// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError, Encode, EncodeError},
    file::{resource_file_path, rewrite_atomic, MAGIC_BYTES},
    time::Timestamp,
    DeviceId,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
    path::Path,
    sync::Arc,
};
use varint_rs::{VarintReader, VarintWriter};
use xxhash_rust::xxh3::xxh3_64;

const CHECKSUM_LEN: usize = std::mem::size_of::<u64>();

/// Time index of a data file
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TimeIndex {
    /// Coarse index, only knows the time range of the whole file
    File {
        /// Smallest timestamp in the file
        start: Timestamp,

        /// Largest timestamp in the file
        end: Timestamp,
    },

    /// Per-device time ranges
    Device(Arc<DeviceTimeIndex>),
}

/// Per-device `[start, end]` time ranges of a data file
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceTimeIndex {
    devices: BTreeMap<DeviceId, (Timestamp, Timestamp)>,
}

impl DeviceTimeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `device` has data at `[start, end]`, widening an
    /// existing range if the device is already known.
    pub fn update(&mut self, device: DeviceId, start: Timestamp, end: Timestamp) {
        debug_assert!(start <= end, "device start must be <= end");

        self.devices
            .entry(device)
            .and_modify(|(s, e)| {
                *s = (*s).min(start);
                *e = (*e).max(end);
            })
            .or_insert((start, end));
    }

    /// Returns `true` if there are no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the amount of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Iterates over all devices in order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.keys()
    }

    /// Iterates over all devices and their time ranges in order.
    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, Timestamp, Timestamp)> {
        self.devices
            .iter()
            .map(|(device, (start, end))| (device, *start, *end))
    }

    /// Gets the first timestamp of a device.
    #[must_use]
    pub fn start_time(&self, device: &DeviceId) -> Option<Timestamp> {
        self.devices.get(device).map(|(start, _)| *start)
    }

    /// Gets the last timestamp of a device.
    #[must_use]
    pub fn end_time(&self, device: &DeviceId) -> Option<Timestamp> {
        self.devices.get(device).map(|(_, end)| *end)
    }

    /// Time range covering all devices.
    #[must_use]
    pub fn file_range(&self) -> Option<(Timestamp, Timestamp)> {
        self.devices
            .values()
            .copied()
            .reduce(|(s1, e1), (s2, e2)| (s1.min(s2), e1.max(e2)))
    }

    /// Writes the index next to its data file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    pub fn persist(&self, data_file_path: &Path) -> crate::Result<()> {
        let path = resource_file_path(data_file_path);
        log::trace!("Writing device time index to {}", path.display());

        let mut bytes = Vec::new();
        self.encode_into(&mut bytes)?;

        let checksum = xxh3_64(&bytes);
        bytes.write_u64::<BigEndian>(checksum)?;

        rewrite_atomic(&path, &bytes)?;

        Ok(())
    }

    /// Loads the index of a data file from its sidecar file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs, or the file is corrupted.
    pub fn load(data_file_path: &Path) -> crate::Result<Self> {
        let path = resource_file_path(data_file_path);
        log::trace!("Loading device time index from {}", path.display());

        let bytes = std::fs::read(&path)?;

        let Some(split) = bytes.len().checked_sub(CHECKSUM_LEN) else {
            return Err(DecodeError::InvalidHeader("DeviceTimeIndex").into());
        };
        let (payload, mut trailer) = bytes.split_at(split);

        let expected = trailer.read_u64::<BigEndian>()?;
        let got = xxh3_64(payload);

        if got != expected {
            return Err(crate::Error::InvalidChecksum((got, expected)));
        }

        let mut reader = payload;
        Ok(Self::decode_from(&mut reader)?)
    }
}

impl Encode for DeviceTimeIndex {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_all(&MAGIC_BYTES)?;

        let len = u32::try_from(self.devices.len())
            .map_err(|_| EncodeError::TooLong(("devices", self.devices.len())))?;
        writer.write_u32_varint(len)?;

        for (device, start, end) in self.iter() {
            device.encode_into(writer)?;
            writer.write_i64::<BigEndian>(start)?;
            writer.write_i64::<BigEndian>(end)?;
        }

        Ok(())
    }
}

impl Decode for DeviceTimeIndex {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut magic = [0u8; MAGIC_BYTES.len()];
        reader.read_exact(&mut magic)?;

        let [a, b, c, version] = magic;
        let [expected_a, expected_b, expected_c, expected_version] = MAGIC_BYTES;

        if [a, b, c] != [expected_a, expected_b, expected_c] {
            return Err(DecodeError::InvalidHeader("DeviceTimeIndex"));
        }

        if version != expected_version {
            return Err(DecodeError::InvalidVersion);
        }

        let len = reader.read_u32_varint()?;
        let mut index = Self::new();

        for _ in 0..len {
            let device = DeviceId::decode_from(reader)?;
            let start = reader.read_i64::<BigEndian>()?;
            let end = reader.read_i64::<BigEndian>()?;

            if start > end {
                return Err(DecodeError::InvalidHeader("DeviceTimeIndex"));
            }

            index.update(device, start, end);
        }

        Ok(index)
    }
}

impl FromIterator<(DeviceId, Timestamp, Timestamp)> for DeviceTimeIndex {
    fn from_iter<T: IntoIterator<Item = (DeviceId, Timestamp, Timestamp)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (device, start, end) in iter {
            index.update(device, start, end);
        }
        index
    }
}

impl TimeIndex {
    /// Returns the per-device index, building it from the sidecar file
    /// next to `data_file_path` if only a coarse index is in memory.
    pub fn device_index(&self, data_file_path: &Path) -> crate::Result<Arc<DeviceTimeIndex>> {
        match self {
            Self::Device(index) => Ok(index.clone()),
            Self::File { .. } => DeviceTimeIndex::load(data_file_path).map(Arc::new),
        }
    }

    /// Time range of the whole file.
    #[must_use]
    pub fn file_range(&self) -> Option<(Timestamp, Timestamp)> {
        match self {
            Self::File { start, end } => Some((*start, *end)),
            Self::Device(index) => index.file_range(),
        }
    }

    /// Degrades to a coarse index, e.g. to save memory.
    #[must_use]
    pub fn to_coarse(&self) -> Option<Self> {
        self.file_range()
            .map(|(start, end)| Self::File { start, end })
    }
}
