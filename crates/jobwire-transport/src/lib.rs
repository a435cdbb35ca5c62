//! Persistent WebSocket transport for jobwire workers.
//!
//! This is the lowest layer of jobwire. It opens one ordered, bidirectional
//! session to a dispatcher, attaching the worker's bearer credential to the
//! upgrade request, and hands back independent write and read halves:
//! - [`FrameSink`] sends one binary message per frame and performs the close handshake
//! - [`FrameSource`] yields the next data frame, hiding ping/pong traffic

pub mod error;
pub mod target;
pub mod ws;

pub use error::{Result, TransportError};
pub use target::{Target, DEFAULT_WORKER_PATH};
pub use ws::{connect, FrameSink, FrameSource, NORMAL_CLOSURE};
