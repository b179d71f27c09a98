//! Wire vocabulary for the door-lock serial link.
//!
//! The front node (keypad and display) and the custody node (motor, alarm
//! and credential storage) share a single full-duplex byte stream. There are
//! no frames on that stream: every byte is either one of the fixed control
//! values in [`ControlByte`], a credential digit (`1..=9`), or a match status
//! (`0`/`1`). Message boundaries are implied entirely by the exchange that is
//! currently running on both sides.
//!
//! This crate holds the values both nodes must agree on bit-for-bit, the
//! [`Credential`] type whose invariants the rest of the system relies on, and
//! the persistent [`CredentialRecord`] layout.
//!
//! # Security
//!
//! None to speak of. Credentials cross the link in clear and the secret space
//! is 9^5. The types here preserve behaviour, not strength.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod control;
pub mod credential;
pub mod errors;
pub mod record;

pub use control::{ControlByte, CustodyReply, DIGIT_PACING, MatchStatus, Selector};
pub use credential::{CREDENTIAL_LEN, Credential, Digit};
pub use errors::{ProtocolError, Result};
pub use record::{CredentialRecord, STORE_BASE_ADDRESS};
