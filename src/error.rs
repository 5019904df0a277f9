//! Error types for score parsing.
//!
//! Per-tick playback never errors (see [`crate::player::Player::tick`]): a
//! malformed event stream reached while ticking is recovered locally by
//! ending the offending track, not by raising an error. The only place a
//! [`ScoreError`] can occur is when a score buffer is parsed up front.

/// Errors that can occur when parsing a packed score buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The buffer is too small to contain even the fixed header fields.
    #[error("score buffer too small: need at least {need} bytes, got {got}")]
    TooSmall {
        /// Minimum number of header bytes required.
        need: usize,
        /// Actual buffer length.
        got: usize,
    },

    /// The `size` field in the header doesn't match the buffer length.
    #[error("header declares size {declared}, but buffer is {actual} bytes")]
    SizeMismatch {
        /// Size recorded in bytes 0..1 of the header.
        declared: u16,
        /// Actual buffer length.
        actual: usize,
    },

    /// `pattern_count` exceeds the limit of 256 from spec §6.
    #[error("pattern count {0} exceeds the 256-pattern limit")]
    TooManyPatterns(usize),

    /// `track_count` exceeds the limit of 16 from spec §6.
    #[error("track count {0} exceeds the 16-track limit")]
    TooManyTracks(usize),

    /// An offset recorded in the pattern or track table points outside the
    /// buffer, or pattern/track offsets are not monotonically non-decreasing.
    #[error("offset table entry {index} ({kind}) points to {offset}, outside the {len}-byte buffer")]
    OffsetOutOfRange {
        /// `"pattern"` or `"track"`.
        kind: &'static str,
        /// Index within the pattern/track offset table.
        index: usize,
        /// The out-of-range offset.
        offset: u16,
        /// Buffer length.
        len: usize,
    },
}

/// Result type for score parsing operations.
pub type Result<T> = std::result::Result<T, ScoreError>;
