// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const MAGIC_BYTES: [u8; 4] = [b'S', b'T', b'L', 1];

/// Suffix of the per-file device index sidecar
pub const RESOURCE_FILE_SUFFIX: &str = ".resource";

/// Gets the path of the device index sidecar of a data file
#[must_use]
pub fn resource_file_path(data_file_path: &Path) -> PathBuf {
    let mut path = data_file_path.as_os_str().to_owned();
    path.push(RESOURCE_FILE_SUFFIX);
    path.into()
}

/// Atomically rewrites a file
pub fn rewrite_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let folder = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent folder"))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(folder)?;
    temp_file.write_all(content)?;
    temp_file.persist(path)?;

    // TODO: not sure why it fails on Windows...
    #[cfg(not(target_os = "windows"))]
    {
        let file = std::fs::File::open(path)?;
        file.sync_all()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn atomic_rewrite() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;

        let path = dir.path().join("test.txt");
        {
            let mut file = File::create(&path)?;
            write!(file, "asdasdasdasdasd")?;
        }

        rewrite_atomic(&path, b"newcontent")?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!("newcontent", content);

        Ok(())
    }

    #[test]
    fn resource_path() {
        let path = resource_file_path(Path::new("/data/0/1-1-0-0.tsfile"));
        assert_eq!(Path::new("/data/0/1-1-0-0.tsfile.resource"), path);
    }
}
