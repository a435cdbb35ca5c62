//! Worker side of the jobwire dispatch protocol.
//!
//! Connect to a dispatcher, register for a job type, answer availability
//! requests and count job assignments. Inbound messages are handled on their own
//! tasks so a slow handler never stalls the receive loop; every outbound
//! message goes through one exclusive write path.

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod identity;
pub mod message;
mod session;
pub mod state;

pub use client::{ClientPhase, SessionEnd, WorkerClient};
pub use config::WorkerConfig;
pub use connector::{connect, connect_with_config};
pub use error::{Result, WorkerError};
pub use identity::{JobType, WorkerIdentity};
pub use message::{
    AvailabilityResponse, CodecError, InboundMessage, Job, OutboundMessage, RegisterAck,
};
pub use state::{WorkerState, WorkerStateSnapshot};
