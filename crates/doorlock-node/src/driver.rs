//! Device seams.
//!
//! Each trait is the narrowest interface a runtime needs from one external
//! collaborator. Production wires in TCP, stdin and log output; tests and
//! simulations wire in scripted and recording implementations.

use async_trait::async_trait;
use doorlock_core::{AlarmState, MotorCommand, Screen};

use crate::error::NodeError;

/// Point-to-point byte link to the other node.
#[async_trait]
pub trait SerialLink: Send {
    /// Send one byte. Returns once the byte has been handed to the link.
    async fn send(&mut self, byte: u8) -> Result<(), NodeError>;

    /// Receive the next byte, waiting as long as it takes.
    ///
    /// Must be cancel-safe: if the future is dropped before completing, no
    /// byte was consumed. Returns [`NodeError::LinkClosed`] once the peer is
    /// gone.
    async fn receive(&mut self) -> Result<u8, NodeError>;
}

/// Source of raw key codes.
#[async_trait]
pub trait Keypad: Send {
    /// Next key code, or `None` once no more input will ever arrive.
    ///
    /// Must be cancel-safe.
    async fn next_key(&mut self) -> Option<u8>;
}

/// Periodic tick source.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick. Must be cancel-safe.
    async fn tick(&mut self);
}

/// Text display of the front node.
pub trait Display: Send {
    /// Replace the display contents.
    fn show(&mut self, screen: Screen);

    /// Append one masking symbol to the input row.
    fn mask_digit(&mut self);
}

/// Door motor and alarm of the custody node.
pub trait Actuator: Send {
    /// Drive the motor. Fire and forget.
    fn motor(&mut self, command: MotorCommand);

    /// Switch the alarm. Fire and forget.
    fn alarm(&mut self, state: AlarmState);
}
