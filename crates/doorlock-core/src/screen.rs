//! Display text catalogue.

use std::fmt;

use crate::timing::DoorPhase;

/// Everything the front node can put on its display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// First entry of a new credential
    CreatePassword,
    /// Repeat entry of a new credential
    ReenterPassword,
    /// Credential entry for a verify request
    EnterPassword,
    /// Open door / change password menu
    MainMenu,
    /// Setup entries differed
    Mismatch,
    /// Verify request rejected
    WrongPassword,
    /// Verify request rejected and keypad locked
    LockedOut,
    /// Door sequence, motor clockwise
    DoorUnlocking,
    /// Door sequence, door open
    DoorOpen,
    /// Door sequence, motor counter-clockwise
    DoorLocking,
}

impl Screen {
    /// Top and bottom display rows.
    pub const fn lines(self) -> (&'static str, &'static str) {
        match self {
            Self::CreatePassword => ("Enter a Password:", ""),
            Self::ReenterPassword => ("Re-Enter the same", "password:"),
            Self::EnterPassword => ("Enter the pass:", ""),
            Self::MainMenu => ("+ : Open Door", "- : Change Pass"),
            Self::Mismatch => ("PASSWORD MISMATCH", ""),
            Self::WrongPassword => ("Wrong Password", ""),
            Self::LockedOut => ("Wrong Password", "Keypad locked"),
            Self::DoorUnlocking => ("Door is unlocking", ""),
            Self::DoorOpen => ("Door is now open", ""),
            Self::DoorLocking => ("Door is locking", ""),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (top, bottom) = self.lines();
        if bottom.is_empty() { f.write_str(top) } else { write!(f, "{top} / {bottom}") }
    }
}

impl From<DoorPhase> for Screen {
    fn from(phase: DoorPhase) -> Self {
        match phase {
            DoorPhase::Unlocking => Self::DoorUnlocking,
            DoorPhase::HeldOpen => Self::DoorOpen,
            DoorPhase::Locking => Self::DoorLocking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_rows() {
        assert_eq!(Screen::MainMenu.to_string(), "+ : Open Door / - : Change Pass");
        assert_eq!(Screen::DoorOpen.to_string(), "Door is now open");
    }
}
