//! The lock as its user sees it.

use doorlock_proto::CREDENTIAL_LEN;

use super::operation::{ModelCredential, Operation};

/// What an operation ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Door ran its full unlock, hold and lock cycle
    Opened,
    /// Credential replaced after this many mismatched setup rounds
    Changed {
        /// Setup rounds whose two entries differed
        mismatches: u32,
    },
    /// Credential rejected, counter advanced
    Wrong,
    /// Credential rejected and the lockout ran to completion
    LockedOut,
    /// Nothing observable happened
    NoEffect,
}

/// Reference lock: a stored credential and a failure counter.
///
/// Both nodes keep their own counter. They only ever move together, so the
/// model keeps one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockModel {
    stored: [u8; CREDENTIAL_LEN],
    failures: u32,
    max_attempts: u32,
}

impl LockModel {
    /// Lock provisioned with `stored` and a clean counter.
    pub fn new(stored: [u8; CREDENTIAL_LEN], max_attempts: u32) -> Self {
        Self { stored, failures: 0, max_attempts }
    }

    /// Credential that currently opens the door.
    pub fn stored(&self) -> [u8; CREDENTIAL_LEN] {
        self.stored
    }

    /// Consecutive rejected credentials.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Apply an operation and return what it ended in.
    pub fn apply(&mut self, op: &Operation) -> Verdict {
        match op {
            Operation::OpenDoor { credential } => {
                self.verify(*credential).unwrap_or(Verdict::Opened)
            },
            Operation::ChangePassword { current, new, confirm } => {
                if let Some(rejected) = self.verify(*current) {
                    return rejected;
                }
                self.stored = new.digits();
                Verdict::Changed { mismatches: u32::from(new.digits() != confirm.digits()) }
            },
            Operation::Noise { .. } | Operation::Idle { .. } => Verdict::NoEffect,
        }
    }

    /// `None` if the credential is accepted, the rejection otherwise.
    fn verify(&mut self, credential: ModelCredential) -> Option<Verdict> {
        if credential.digits() == self.stored {
            self.failures = 0;
            return None;
        }

        self.failures += 1;
        if self.failures >= self.max_attempts {
            self.failures = 0;
            Some(Verdict::LockedOut)
        } else {
            Some(Verdict::Wrong)
        }
    }
}
