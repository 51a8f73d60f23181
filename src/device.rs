// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::{read_str, write_str, Decode, DecodeError, Encode, EncodeError};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::{
    io::{Read, Write},
    sync::Arc,
};
use varint_rs::{VarintReader, VarintWriter};

/// Prefix of every tree-model device path
pub const TREE_ROOT_PREFIX: &str = "root.";

const TAG_TREE: u8 = 0;
const TAG_TABLE: u8 = 1;

/// Identifies one time series entity inside a data file
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum DeviceId {
    /// Tree-model device, e.g. `root.sg.d1`
    Tree(Arc<str>),

    /// Table-model device, a row key of some table
    Table {
        /// Table name
        table: Arc<str>,

        /// Identifying tag values
        tags: Vec<Arc<str>>,
    },
}

impl DeviceId {
    /// Creates a tree-model device from its full path.
    #[must_use]
    pub fn tree<S: Into<Arc<str>>>(path: S) -> Self {
        Self::Tree(path.into())
    }

    /// Creates a table-model device.
    #[must_use]
    pub fn table<S: Into<Arc<str>>>(table: S, tags: impl IntoIterator<Item = S>) -> Self {
        Self::Table {
            table: table.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the device belongs to the tree model.
    ///
    /// TTLs of tree-model devices are keyed by path, table-model
    /// devices by their owning database and table.
    #[must_use]
    pub fn is_tree_model(&self) -> bool {
        match self {
            Self::Tree(path) => path.starts_with(TREE_ROOT_PREFIX),
            Self::Table { .. } => false,
        }
    }

    /// Returns the table name (for tree-model devices, the full path).
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Tree(path) => path,
            Self::Table { table, .. } => table,
        }
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(path) => write!(f, "{path}"),
            Self::Table { table, tags } => {
                write!(f, "{table}")?;
                for tag in tags {
                    write!(f, ".{tag}")?;
                }
                Ok(())
            }
        }
    }
}

impl Encode for DeviceId {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        match self {
            Self::Tree(path) => {
                writer.write_u8(TAG_TREE)?;
                write_str(writer, path)?;
            }
            Self::Table { table, tags } => {
                writer.write_u8(TAG_TABLE)?;
                write_str(writer, table)?;

                let len = u32::try_from(tags.len())
                    .map_err(|_| EncodeError::TooLong(("tags", tags.len())))?;
                writer.write_u32_varint(len)?;

                for tag in tags {
                    write_str(writer, tag)?;
                }
            }
        }
        Ok(())
    }
}

impl Decode for DeviceId {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        match reader.read_u8()? {
            TAG_TREE => Ok(Self::Tree(read_str(reader)?.into())),
            TAG_TABLE => {
                let table = read_str(reader)?;
                let len = reader.read_u32_varint()?;

                let mut tags = Vec::new();
                for _ in 0..len {
                    tags.push(Arc::from(read_str(reader)?));
                }

                Ok(Self::Table {
                    table: table.into(),
                    tags,
                })
            }
            tag => Err(DecodeError::InvalidTag(("DeviceId", tag))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn device_model() {
        assert!(DeviceId::tree("root.sg.d1").is_tree_model());
        assert!(!DeviceId::tree("sg.d1").is_tree_model());
        assert!(!DeviceId::table("t1", ["a", "b"]).is_tree_model());
    }

    #[test]
    fn device_display() {
        assert_eq!("t1.a.b", DeviceId::table("t1", ["a", "b"]).to_string());
        assert_eq!("root.sg.d1", DeviceId::tree("root.sg.d1").to_string());
    }

    #[test]
    fn device_decode_invalid_tag() {
        let bytes = [7u8, 0];
        assert!(matches!(
            DeviceId::decode_from(&mut &bytes[..]),
            Err(DecodeError::InvalidTag(("DeviceId", 7)))
        ));
    }

    #[test]
    fn device_decode_huge_tag_count() -> crate::Result<()> {
        use varint_rs::VarintWriter;

        let mut bytes = vec![TAG_TABLE];
        write_str(&mut bytes, "t1")?;
        bytes.write_u32_varint(u32::MAX)?;
        write_str(&mut bytes, "a")?;

        assert!(matches!(
            DeviceId::decode_from(&mut &bytes[..]),
            Err(DecodeError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof
        ));

        Ok(())
    }

    #[test]
    fn device_table_coding() -> crate::Result<()> {
        let device = DeviceId::table("weather", ["beijing", "d1"]);
        let bytes = device.encode_into_vec();
        assert_eq!(device, DeviceId::decode_from(&mut &bytes[..])?);
        Ok(())
    }
}
