//! Persistent credential layout.
//!
//! The custody node keeps the credential as five consecutive bytes starting
//! at [`STORE_BASE_ADDRESS`], one digit per byte, in entry order. There is no
//! header, checksum or version byte; a freshly erased store reads back as
//! `0xFF` in every cell and therefore never parses as a credential.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    credential::{CREDENTIAL_LEN, Credential},
    errors::ProtocolError,
};

/// Store address of the first credential byte.
pub const STORE_BASE_ADDRESS: u16 = 0x00;

/// On-store credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CredentialRecord {
    digits: [u8; CREDENTIAL_LEN],
}

impl CredentialRecord {
    /// Size of the record in bytes.
    pub const SIZE: usize = CREDENTIAL_LEN;

    /// Record for a validated credential.
    pub fn from_credential(credential: &Credential) -> Self {
        Self { digits: credential.to_wire() }
    }

    /// Interpret the first [`Self::SIZE`] bytes of `bytes` as a record.
    ///
    /// Trailing bytes are ignored. The digits are not validated here; use
    /// [`Self::credential`] for that.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let head = bytes.get(..Self::SIZE).ok_or(ProtocolError::TruncatedRecord {
            expected: Self::SIZE,
            actual: bytes.len(),
        })?;
        Self::read_from_bytes(head).map_err(|_| ProtocolError::TruncatedRecord {
            expected: Self::SIZE,
            actual: bytes.len(),
        })
    }

    /// Raw record bytes, ready to be written starting at the base address.
    pub fn to_bytes(&self) -> [u8; CREDENTIAL_LEN] {
        self.digits
    }

    /// Validate the stored digits.
    pub fn credential(&self) -> Result<Credential, ProtocolError> {
        Credential::from_wire(self.digits)
    }
}
