//! Worker client for persistent job-dispatch sessions.
//!
//! jobwire connects a worker process to a dispatcher over one long-lived
//! WebSocket, registers it for a job type, answers availability requests, and
//! tracks job assignments.
//!
//! # Crate Structure
//!
//! - [`transport`]: WebSocket session with bearer credentials
//! - [`frame`]: Tagged binary envelope for protocol messages
//! - [`worker`]: Protocol client, handlers, and worker state (behind `worker` feature)

/// Re-export transport types.
pub mod transport {
    pub use jobwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use jobwire_frame::*;
}

/// Re-export worker types (requires `worker` feature).
#[cfg(feature = "worker")]
pub mod worker {
    pub use jobwire_worker::*;
}
