//! Control bytes exchanged between the two nodes.
//!
//! Values are fixed by the deployed firmware on both ends of the link and
//! must never change.

use std::time::Duration;

use crate::errors::ProtocolError;

/// Minimum gap the sender leaves after each credential digit.
pub const DIGIT_PACING: Duration = Duration::from_millis(100);

/// Control byte vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlByte {
    /// "I am about to send a password"
    ReadyToSend = 0x10,
    /// "Send it, I'm listening"
    ReadyToReceive = 0x20,
    /// Transaction selector: change password
    ChangePasswordOption = 0x18,
    /// Transaction selector: open door
    OpenDoorOption = 0x19,
    /// Custody to front: verification failed
    WrongPassword = 0x25,
    /// Custody to front: verified, change-password flow begins
    ChangingPassword = 0x30,
    /// Custody to front: verified, door sequence begins
    UnlockingDoor = 0x31,
}

impl ControlByte {
    /// Every control byte, in wire-value order.
    pub const ALL: [Self; 7] = [
        Self::ReadyToSend,
        Self::ChangePasswordOption,
        Self::OpenDoorOption,
        Self::ReadyToReceive,
        Self::WrongPassword,
        Self::ChangingPassword,
        Self::UnlockingDoor,
    ];

    /// Wire value.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode a wire value, returning `None` for anything outside the
    /// vocabulary.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x10 => Some(Self::ReadyToSend),
            0x20 => Some(Self::ReadyToReceive),
            0x18 => Some(Self::ChangePasswordOption),
            0x19 => Some(Self::OpenDoorOption),
            0x25 => Some(Self::WrongPassword),
            0x30 => Some(Self::ChangingPassword),
            0x31 => Some(Self::UnlockingDoor),
            _ => None,
        }
    }
}

impl From<ControlByte> for u8 {
    fn from(byte: ControlByte) -> Self {
        byte.to_u8()
    }
}

impl TryFrom<u8> for ControlByte {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(ProtocolError::UnknownControlByte(value))
    }
}

/// Transaction requested after a credential in the verify exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Run the door sequence on success.
    OpenDoor,
    /// Re-enter credential setup on success.
    ChangePassword,
}

impl Selector {
    /// Selector byte sent after the candidate digits.
    pub const fn control_byte(self) -> ControlByte {
        match self {
            Self::OpenDoor => ControlByte::OpenDoorOption,
            Self::ChangePassword => ControlByte::ChangePasswordOption,
        }
    }

    /// Decode a selector byte. Any other value yields `None`.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match ControlByte::from_u8(value) {
            Some(ControlByte::OpenDoorOption) => Some(Self::OpenDoor),
            Some(ControlByte::ChangePasswordOption) => Some(Self::ChangePassword),
            _ => None,
        }
    }

    /// Reply the custody node sends when the candidate matches.
    pub const fn approval(self) -> CustodyReply {
        match self {
            Self::OpenDoor => CustodyReply::UnlockingDoor,
            Self::ChangePassword => CustodyReply::ChangingPassword,
        }
    }
}

/// Custody node's answer to a verify request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustodyReply {
    /// Matched with [`Selector::OpenDoor`].
    UnlockingDoor,
    /// Matched with [`Selector::ChangePassword`].
    ChangingPassword,
    /// Candidate did not match the stored credential.
    WrongPassword,
}

impl CustodyReply {
    /// Wire representation.
    pub const fn control_byte(self) -> ControlByte {
        match self {
            Self::UnlockingDoor => ControlByte::UnlockingDoor,
            Self::ChangingPassword => ControlByte::ChangingPassword,
            Self::WrongPassword => ControlByte::WrongPassword,
        }
    }

    /// Decode a reply byte. Any other value yields `None`.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match ControlByte::from_u8(value) {
            Some(ControlByte::UnlockingDoor) => Some(Self::UnlockingDoor),
            Some(ControlByte::ChangingPassword) => Some(Self::ChangingPassword),
            Some(ControlByte::WrongPassword) => Some(Self::WrongPassword),
            _ => None,
        }
    }
}

/// Result of comparing the two credentials of a setup exchange.
///
/// Sent as a bare byte after `READY_TO_SEND`: `1` for matched, `0` for
/// unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatchStatus {
    /// Confirmation differed from the candidate.
    Unmatched = 0,
    /// Confirmation equalled the candidate; the credential was stored.
    Matched = 1,
}

impl MatchStatus {
    /// Wire value.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode a status byte. Only `1` counts as matched.
    pub const fn from_u8(value: u8) -> Self {
        if value == Self::Matched as u8 { Self::Matched } else { Self::Unmatched }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn wire_values_are_fixed() {
        let values: Vec<u8> = ControlByte::ALL.iter().map(|b| b.to_u8()).collect();
        assert_eq!(values, hex!("10 18 19 20 25 30 31"));
    }

    #[test]
    fn control_byte_roundtrip() {
        for byte in ControlByte::ALL {
            assert_eq!(ControlByte::try_from(byte.to_u8()), Ok(byte));
        }
    }

    #[test]
    fn digits_are_not_control_bytes() {
        for digit in 0..=9u8 {
            assert_eq!(ControlByte::from_u8(digit), None);
        }
    }

    #[test]
    fn unknown_control_byte_rejected() {
        assert_eq!(ControlByte::try_from(0x42), Err(ProtocolError::UnknownControlByte(0x42)));
    }

    #[test]
    fn selector_approvals() {
        assert_eq!(Selector::OpenDoor.approval(), CustodyReply::UnlockingDoor);
        assert_eq!(Selector::ChangePassword.approval(), CustodyReply::ChangingPassword);
        assert_eq!(Selector::from_u8(0x19), Some(Selector::OpenDoor));
        assert_eq!(Selector::from_u8(0x18), Some(Selector::ChangePassword));
        assert_eq!(Selector::from_u8(0x10), None);
    }

    #[test]
    fn reply_decoding_ignores_requests() {
        assert_eq!(CustodyReply::from_u8(0x25), Some(CustodyReply::WrongPassword));
        assert_eq!(CustodyReply::from_u8(0x19), None);
    }

    #[test]
    fn only_one_is_matched() {
        assert_eq!(MatchStatus::from_u8(1), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_u8(0), MatchStatus::Unmatched);
        assert_eq!(MatchStatus::from_u8(0x20), MatchStatus::Unmatched);
    }
}
