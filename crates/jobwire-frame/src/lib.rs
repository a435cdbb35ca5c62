//! Tagged binary envelope for jobwire protocol messages.
//!
//! Every protocol message travels as exactly one transport frame laid out as:
//! - A 2-byte magic number ("JW") for sanity checking
//! - A 2-byte little-endian message kind
//! - A 4-byte little-endian body length
//! - The message body
//!
//! The envelope does not interpret bodies. Unknown kinds decode successfully so
//! that higher layers can skip messages they do not understand.

pub mod codec;
pub mod error;
pub mod kind;

pub use codec::{decode_frame, encode_frame, Frame, DEFAULT_MAX_BODY, HEADER_SIZE, MAGIC};
pub use error::{FrameError, Result};
pub use kind::{
    kind_name, AVAILABILITY_REQUEST, AVAILABILITY_RESPONSE, JOB_ASSIGNMENT, REGISTER, REGISTER_ACK,
    RESERVED_KIND_END,
};
