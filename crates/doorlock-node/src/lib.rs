//! Door-lock node runtimes.
//!
//! Binds the pure state machines from `doorlock-core` to real I/O:
//!
//! ```text
//! doorlock-node
//!   ├─ SerialLink / Keypad / Display / Actuator / Ticker   (device seams)
//!   ├─ ByteLink          (serial link over any async byte stream)
//!   ├─ load_config       (JSON config file)
//!   ├─ FileStore         (credential store backed by a file image)
//!   ├─ IntervalTicker    (tokio interval)
//!   ├─ CustodyRuntime    (custody node event loop)
//!   └─ FrontRuntime      (front node event loop)
//! ```
//!
//! All waiting goes through `tokio::time`, so the runtimes run unchanged
//! under a paused clock or a turmoil simulation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod console;
mod driver;
mod error;
mod file_store;
mod link;
mod runtime;
mod ticker;

pub use config::load_config;
pub use driver::{Actuator, Display, Keypad, SerialLink, Ticker};
pub use error::NodeError;
pub use file_store::FileStore;
pub use link::ByteLink;
pub use runtime::{CustodyRuntime, FrontRuntime};
pub use ticker::{ChannelKeypad, IntervalTicker};
