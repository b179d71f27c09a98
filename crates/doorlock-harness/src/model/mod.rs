//! Reference model for model-based testing.
//!
//! The model tracks only what a user of the lock can observe: which
//! credential opens the door, how many wrong entries are on the counter and
//! what each keypad interaction ends in. It knows nothing about the link
//! exchanges that carry those interactions between the two nodes.

mod lock;
pub mod operation;

pub use lock::{LockModel, Verdict};
pub use operation::{ModelCredential, Operation};
