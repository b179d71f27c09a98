//! Door-lock core logic
//!
//! Pure state machines for the two nodes of the door lock, completely
//! decoupled from I/O. Nothing in this crate sleeps, reads a clock or touches
//! a device.
//!
//! # Architecture
//!
//! Each node is an action-returning state machine. The runtime feeds it the
//! one kind of input it is currently blocked on (a link byte, a key press or
//! a tick) and executes the returned actions in order. [`Awaiting`] tells the
//! runtime which input that is.
//!
//! Time exists only as ticks. Every timed wait resets the node's own
//! [`ElapsedSeconds`] counter and completes once it reaches a target; the two
//! nodes never share a counter.
//!
//! # Components
//!
//! - [`custody`]: credential owner, motor and alarm
//! - [`front`]: keypad capture, menu and display
//! - [`exchange`]: setup and verify exchange sub-machines shared by both
//! - [`timing`]: elapsed-seconds counter, holds and the door sequence
//! - [`retry`]: failed-attempt counter and lockout threshold
//! - [`store`]: byte-addressable credential storage
//! - [`config`]: timing and policy constants

pub mod config;
pub mod custody;
pub mod error;
pub mod exchange;
pub mod front;
pub mod retry;
pub mod screen;
pub mod store;
pub mod timing;

pub use config::LockConfig;
pub use custody::{AlarmState, CustodyAction, CustodyNode, CustodyState, MotorCommand};
pub use error::StoreError;
pub use exchange::{LinkAction, SetupRound};
pub use front::{FrontAction, FrontNode, FrontState, Key};
pub use retry::{RetryCounter, RetryOutcome};
pub use screen::Screen;
pub use store::{CredentialStore, MemoryStore};
pub use timing::{Awaiting, DoorPhase, ElapsedSeconds};
