//! Deterministic test harness for the door lock.
//!
//! Three levels of fidelity:
//!
//! - [`World`]: both state machines wired back to back, synchronous, with
//!   virtual ticks. Fast enough for property tests.
//! - [`model`]: reference model of the observable behaviour, the oracle for
//!   model-based tests against [`World`].
//! - [`sim`]: devices and helpers for running the real node runtimes inside a
//!   turmoil simulation over a simulated TCP link.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim;
pub mod world;

pub use model::{LockModel, ModelCredential, Operation, Verdict};
pub use world::{Outcome, World, WorldEvent};
