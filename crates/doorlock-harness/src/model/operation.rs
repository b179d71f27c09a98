//! Operations for model-based testing.
//!
//! Every operation starts and ends with the front node at the main menu. It
//! expands into the full key sequence a user would type, including the keys
//! that only matter if an earlier step succeeds; leftover digits and enter
//! presses are ignored at the menu.

use arbitrary::Arbitrary;
use doorlock_proto::CREDENTIAL_LEN;

/// Keypad code of `+`.
pub const OPEN_DOOR_KEY: u8 = b'+';

/// Keypad code of `-`.
pub const CHANGE_PASSWORD_KEY: u8 = b'-';

/// Keypad code of enter.
pub const ENTER_KEY: u8 = 13;

/// Credential as raw generator output.
///
/// Each byte folds onto the keypad digits 1..=9, so every value is a valid
/// credential and collisions with the stored one stay likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct ModelCredential(pub [u8; CREDENTIAL_LEN]);

impl ModelCredential {
    /// Keypad digit codes.
    pub fn digits(self) -> [u8; CREDENTIAL_LEN] {
        self.0.map(|raw| raw % 9 + 1)
    }

    fn typed(self, keys: &mut Vec<u8>) {
        keys.extend(self.digits());
        keys.push(ENTER_KEY);
    }
}

/// User interactions with the lock.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// `+`, then a credential.
    OpenDoor {
        /// Credential typed after the selection
        credential: ModelCredential,
    },

    /// `-`, the current credential, then a new one twice.
    ///
    /// If the two new entries differ the setup is retried once with the
    /// first entry typed twice.
    ChangePassword {
        /// Credential offered for verification
        current: ModelCredential,
        /// First new entry
        new: ModelCredential,
        /// Second new entry
        confirm: ModelCredential,
    },

    /// A single key press at the menu.
    ///
    /// The menu selection keys are remapped so noise never starts a request.
    Noise {
        /// Raw key code
        code: u8,
    },

    /// Let time pass with nothing happening.
    Idle {
        /// Ticks to wait
        ticks: u8,
    },
}

impl Operation {
    /// Key codes this operation types, in order.
    pub fn key_presses(&self) -> Vec<u8> {
        let mut keys = Vec::new();
        match self {
            Self::OpenDoor { credential } => {
                keys.push(OPEN_DOOR_KEY);
                credential.typed(&mut keys);
            },
            Self::ChangePassword { current, new, confirm } => {
                keys.push(CHANGE_PASSWORD_KEY);
                current.typed(&mut keys);
                new.typed(&mut keys);
                confirm.typed(&mut keys);
                if new.digits() != confirm.digits() {
                    new.typed(&mut keys);
                    new.typed(&mut keys);
                }
            },
            Self::Noise { code } => keys.push(noise_code(*code)),
            Self::Idle { .. } => {},
        }
        keys
    }

    /// Ticks to advance after the keys are consumed.
    pub fn idle_ticks(&self) -> u32 {
        match self {
            Self::Idle { ticks } => u32::from(*ticks),
            _ => 0,
        }
    }
}

fn noise_code(code: u8) -> u8 {
    match code {
        OPEN_DOOR_KEY | CHANGE_PASSWORD_KEY => 0,
        other => other,
    }
}
