use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + kind (2) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "JW" (0x4A 0x57).
pub const MAGIC: [u8; 2] = [0x4A, 0x57];

/// Default maximum body size: 1 MiB.
pub const DEFAULT_MAX_BODY: usize = 1024 * 1024;

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message kind (see [`crate::kind`]).
    pub kind: u16,
    /// Message body, uninterpreted.
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: u16, body: impl Into<Bytes>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }

    /// Encode into a standalone buffer ready for the transport.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.kind, &self.body, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Kind     │ Length    │ Body             │
/// │ 0x4A 0x57    │ (2B LE)  │ (4B LE)   │ (Length bytes)   │
/// │ "JW"         │          │           │                  │
/// └──────────────┴──────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(kind: u16, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_slice(&MAGIC);
    dst.put_u16_le(kind);
    dst.put_u32_le(body.len() as u32);
    dst.put_slice(body);
    Ok(())
}

/// Decode one complete frame.
///
/// The transport already delimits frames, so `src` must hold exactly one
/// frame: trailing or missing body bytes are a [`FrameError::LengthMismatch`].
pub fn decode_frame(mut src: Bytes, max_body: usize) -> Result<Frame> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            len: src.len(),
            header: HEADER_SIZE,
        });
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }
    src.advance(2);

    let kind = src.get_u16_le();
    let declared = src.get_u32_le() as usize;

    if declared > max_body {
        return Err(FrameError::PayloadTooLarge {
            size: declared,
            max: max_body,
        });
    }
    if declared != src.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: src.len(),
        });
    }

    trace!(kind, size = declared, "decoded frame");
    Ok(Frame { kind, body: src })
}
