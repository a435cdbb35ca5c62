//! Message kind identifiers.
//!
//! Kinds 1-255 are reserved for the worker protocol. Anything at or above
//! [`RESERVED_KIND_END`] is free for future or extension messages and is
//! ignored by peers that do not know it.

/// Worker → dispatcher: register a worker for a job type.
pub const REGISTER: u16 = 1;

/// Dispatcher → worker: registration accepted.
pub const REGISTER_ACK: u16 = 2;

/// Dispatcher → worker: can this worker take the job?
pub const AVAILABILITY_REQUEST: u16 = 3;

/// Worker → dispatcher: answer to an availability request.
pub const AVAILABILITY_RESPONSE: u16 = 4;

/// Dispatcher → worker: the job is assigned to this worker.
pub const JOB_ASSIGNMENT: u16 = 5;

/// First kind outside the reserved range.
pub const RESERVED_KIND_END: u16 = 256;

/// Returns a human-readable name for a message kind.
pub fn kind_name(kind: u16) -> &'static str {
    match kind {
        REGISTER => "REGISTER",
        REGISTER_ACK => "REGISTER_ACK",
        AVAILABILITY_REQUEST => "AVAILABILITY_REQUEST",
        AVAILABILITY_RESPONSE => "AVAILABILITY_RESPONSE",
        JOB_ASSIGNMENT => "JOB_ASSIGNMENT",
        0 | 6..=255 => "RESERVED",
        _ => "EXTENSION",
    }
}
