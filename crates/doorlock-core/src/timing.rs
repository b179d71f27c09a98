//! Tick-driven timing.
//!
//! Each node owns one [`ElapsedSeconds`]. A timed wait resets it, then
//! completes once it has been ticked up to the wait's target. The tick path
//! does nothing else, so delivering a tick at any point is always safe.

use crate::config::LockConfig;

/// What a node is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Awaiting {
    /// The next byte from the link
    Byte,
    /// The next key press
    Key,
    /// A hold to run out; only ticks matter
    Hold,
}

/// Ticks since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedSeconds(u32);

impl ElapsedSeconds {
    /// Zeroed counter.
    pub const fn new() -> Self {
        Self(0)
    }

    /// One tick.
    pub fn tick(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Current count.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A wait for `target` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hold {
    target: u32,
}

impl Hold {
    /// Start the wait. Resets `elapsed`.
    pub fn begin(elapsed: &mut ElapsedSeconds, target: u32) -> Self {
        elapsed.reset();
        Self { target }
    }

    /// Whether `elapsed` has reached the target.
    pub fn is_complete(&self, elapsed: ElapsedSeconds) -> bool {
        elapsed.get() >= self.target
    }
}

/// Phase of the door sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorPhase {
    /// Motor clockwise
    Unlocking,
    /// Motor stopped, door open
    HeldOpen,
    /// Motor counter-clockwise
    Locking,
}

impl DoorPhase {
    /// Ticks this phase lasts.
    pub fn ticks(self, config: &LockConfig) -> u32 {
        match self {
            Self::Unlocking => config.door_unlock_ticks,
            Self::HeldOpen => config.door_open_ticks,
            Self::Locking => config.door_lock_ticks,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Unlocking => Some(Self::HeldOpen),
            Self::HeldOpen => Some(Self::Locking),
            Self::Locking => None,
        }
    }
}

/// Phase change reported by [`DoorSequence::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorTransition {
    /// A new phase started
    Entered(DoorPhase),
    /// The last phase ran out
    Finished,
}

/// Unlock, hold open, lock. Always all three, always in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorSequence {
    phase: DoorPhase,
    hold: Hold,
}

impl DoorSequence {
    /// Enter [`DoorPhase::Unlocking`]. Resets `elapsed`.
    pub fn begin(config: &LockConfig, elapsed: &mut ElapsedSeconds) -> Self {
        let phase = DoorPhase::Unlocking;
        Self { phase, hold: Hold::begin(elapsed, phase.ticks(config)) }
    }

    /// Current phase.
    pub const fn phase(&self) -> DoorPhase {
        self.phase
    }

    /// Advance if the current phase has run out.
    ///
    /// Called after every tick. Entering a phase resets `elapsed`.
    pub fn poll(
        &mut self,
        config: &LockConfig,
        elapsed: &mut ElapsedSeconds,
    ) -> Option<DoorTransition> {
        if !self.hold.is_complete(*elapsed) {
            return None;
        }

        match self.phase.next() {
            Some(phase) => {
                self.phase = phase;
                self.hold = Hold::begin(elapsed, phase.ticks(config));
                Some(DoorTransition::Entered(phase))
            },
            None => Some(DoorTransition::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_completes_at_target() {
        let mut elapsed = ElapsedSeconds::new();
        elapsed.tick();
        let hold = Hold::begin(&mut elapsed, 2);
        assert_eq!(elapsed.get(), 0);
        elapsed.tick();
        assert!(!hold.is_complete(elapsed));
        elapsed.tick();
        assert!(hold.is_complete(elapsed));
    }

    #[test]
    fn door_sequence_phase_lengths() {
        let config = LockConfig::default();
        let mut elapsed = ElapsedSeconds::new();
        let mut sequence = DoorSequence::begin(&config, &mut elapsed);

        let mut transitions = Vec::new();
        for tick in 1..=40u32 {
            elapsed.tick();
            if let Some(transition) = sequence.poll(&config, &mut elapsed) {
                transitions.push((tick, transition));
                if transition == DoorTransition::Finished {
                    break;
                }
            }
        }

        assert_eq!(
            transitions,
            vec![
                (15, DoorTransition::Entered(DoorPhase::HeldOpen)),
                (18, DoorTransition::Entered(DoorPhase::Locking)),
                (33, DoorTransition::Finished),
            ]
        );
    }

    #[test]
    fn counter_saturates() {
        let mut elapsed = ElapsedSeconds(u32::MAX);
        elapsed.tick();
        assert_eq!(elapsed.get(), u32::MAX);
    }
}
