//! Byte-addressable credential storage.
//!
//! The custody node never caches the credential: [`load_credential`] is
//! called immediately before every comparison.

use doorlock_proto::{CREDENTIAL_LEN, Credential, CredentialRecord};

use crate::error::StoreError;

/// Persistent byte storage with EEPROM-style semantics.
pub trait CredentialStore {
    /// Read one byte.
    fn read(&self, addr: u16) -> Result<u8, StoreError>;

    /// Write one byte. Durable once this returns `Ok`.
    fn write(&mut self, addr: u16, byte: u8) -> Result<(), StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &mut S {
    fn read(&self, addr: u16) -> Result<u8, StoreError> {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, byte: u8) -> Result<(), StoreError> {
        (**self).write(addr, byte)
    }
}

/// Value of a never-written cell.
pub const ERASED: u8 = 0xFF;

/// In-memory store, starting fully erased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    cells: Vec<u8>,
    writes: usize,
}

impl MemoryStore {
    /// Default capacity, matching a 1 KiB EEPROM.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Erased store of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { cells: vec![ERASED; capacity], writes: 0 }
    }

    /// Store pre-loaded with `credential` at `base`.
    pub fn with_credential(base: u16, credential: &Credential) -> Result<Self, StoreError> {
        let mut store = Self::default();
        persist_credential(&mut store, base, credential)?;
        store.writes = 0;
        Ok(store)
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Every cell.
    pub fn snapshot(&self) -> &[u8] {
        &self.cells
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

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl CredentialStore for MemoryStore {
    fn read(&self, addr: u16) -> Result<u8, StoreError> {
        let index = self.index(addr)?;
        Ok(self.cells[index])
    }

    fn write(&mut self, addr: u16, byte: u8) -> Result<(), StoreError> {
        let index = self.index(addr)?;
        self.cells[index] = byte;
        self.writes += 1;
        Ok(())
    }
}

fn credential_addresses(base: u16) -> impl Iterator<Item = Result<u16, StoreError>> {
    (0..CREDENTIAL_LEN as u16).map(move |offset| {
        base.checked_add(offset)
            .ok_or(StoreError::OutOfRange { addr: base, capacity: usize::from(u16::MAX) + 1 })
    })
}

/// Read the stored credential.
///
/// Returns `Ok(None)` when the cells do not hold five valid digits, which is
/// the state of a never-programmed device.
pub fn load_credential<S: CredentialStore + ?Sized>(
    store: &S,
    base: u16,
) -> Result<Option<Credential>, StoreError> {
    let mut bytes = [0u8; CREDENTIAL_LEN];
    for (slot, addr) in bytes.iter_mut().zip(credential_addresses(base)) {
        *slot = store.read(addr?)?;
    }

    Ok(CredentialRecord::parse(&bytes).ok().and_then(|record| record.credential().ok()))
}

/// Write `credential` one byte per address starting at `base`.
pub fn persist_credential<S: CredentialStore + ?Sized>(
    store: &mut S,
    base: u16,
    credential: &Credential,
) -> Result<(), StoreError> {
    let record = CredentialRecord::from_credential(credential);
    for (byte, addr) in record.to_bytes().into_iter().zip(credential_addresses(base)) {
        store.write(addr?, byte)?;
    }
    Ok(())
}
