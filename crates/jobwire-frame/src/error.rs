/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4A57 \"JW\")")]
    InvalidMagic,

    /// The frame is shorter than its header.
    #[error("truncated frame ({len} bytes, header is {header})")]
    Truncated { len: usize, header: usize },

    /// The declared body length does not match the bytes that follow the header.
    #[error("body length mismatch (declared {declared}, actual {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    /// The body exceeds the configured maximum size.
    #[error("body too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
