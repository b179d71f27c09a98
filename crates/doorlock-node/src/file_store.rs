//! File-backed credential store.
//!
//! The file is a raw image of the device: one byte per address, erased cells
//! read as `0xFF`. Writes go to the file before they are acknowledged, so a
//! credential survives a restart of the custody node.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use doorlock_core::{CredentialStore, StoreError, store::ERASED};
use tracing::{debug, info};

use crate::error::NodeError;

/// Write-through store over a fixed-size image file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
    cells: Vec<u8>,
}

impl FileStore {
    /// Open `path`, creating or growing it to `capacity` erased bytes.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, NodeError> {
        let path = path.as_ref().to_path_buf();
        let image_err = |source| NodeError::StoreImage { path: path.clone(), source };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(image_err)?;

        let mut cells = Vec::with_capacity(capacity);
        file.read_to_end(&mut cells).map_err(image_err)?;
        let existing = cells.len();
        cells.resize(capacity, ERASED);

        if existing < capacity {
            file.seek(SeekFrom::Start(existing as u64)).map_err(image_err)?;
            file.write_all(&cells[existing..]).map_err(image_err)?;
            file.sync_data().map_err(image_err)?;
            info!(path = %path.display(), capacity, "store image initialised");
        }

        Ok(Self { path, file, cells })
    }

    /// Image file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn index(&self, addr: u16) -> Result<usize, StoreError> {
        let index = usize::from(addr);
        if index < self.cells.len() {
            Ok(index)
        } else {
            Err(StoreError::OutOfRange { addr, capacity: self.cells.len() })
        }
    }
}

impl CredentialStore for FileStore {
    fn read(&self, addr: u16) -> Result<u8, StoreError> {
        let index = self.index(addr)?;
        Ok(self.cells[index])
    }

    fn write(&mut self, addr: u16, byte: u8) -> Result<(), StoreError> {
        let index = self.index(addr)?;
        let io_err = |err: std::io::Error| StoreError::Io { reason: err.to_string() };

        self.file.seek(SeekFrom::Start(u64::from(addr))).map_err(io_err)?;
        self.file.write_all(&[byte]).map_err(io_err)?;
        self.file.sync_data().map_err(io_err)?;
        self.cells[index] = byte;
        debug!(addr, "store: byte written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use doorlock_core::store::{load_credential, persist_credential};
    use doorlock_proto::Credential;

    use super::*;

    #[test]
    fn fresh_image_is_erased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");
        let store = FileStore::open(&path, 64).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF; 64]);
        assert_eq!(load_credential(&store, 0).unwrap(), None);
    }

    #[test]
    fn credential_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");
        let credential: Credential = "86429".parse().unwrap();

        {
            let mut store = FileStore::open(&path, 64).unwrap();
            persist_credential(&mut store, 0, &credential).unwrap();
        }

        let store = FileStore::open(&path, 64).unwrap();
        assert_eq!(load_credential(&store, 0).unwrap(), Some(credential));
    }

    #[test]
    fn out_of_range_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("eeprom.bin"), 8).unwrap();
        assert_eq!(store.write(8, 1), Err(StoreError::OutOfRange { addr: 8, capacity: 8 }));
    }
}
