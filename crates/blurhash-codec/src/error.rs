//! Error types for BlurHash encoding and decoding.

use thiserror::Error;

/// Errors that can occur during BlurHash encoding or decoding.
///
/// Alphabet violations ([`BlurhashError::InvalidInput`]) are reported as-is
/// when they occur inside a hash, so callers can tell a malformed alphabet
/// apart from a structurally malformed hash ([`BlurhashError::InvalidHash`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlurhashError {
    /// A character outside the base83 alphabet was encountered.
    #[error("invalid base83 character {character:?} at index {index}")]
    InvalidInput {
        /// The offending character.
        character: char,
        /// Byte offset of the character in the decoded string.
        index: usize,
    },

    /// A base83 string is too long to fit into a 64-bit integer.
    #[error("base83 value of {length} digits overflows u64")]
    Base83Overflow {
        /// Number of digits in the input.
        length: usize,
    },

    /// The hash is structurally invalid.
    #[error("invalid BlurHash: {0}")]
    InvalidHash(InvalidHashKind),

    /// The requested component counts are out of range (1..=9).
    #[error("component count out of range: x = {x}, y = {y} (must be 1..=9)")]
    InvalidComponents {
        /// Requested horizontal components.
        x: u32,
        /// Requested vertical components.
        y: u32,
    },

    /// The image dimensions are invalid (zero width or height).
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// The width value.
        width: u32,
        /// The height value.
        height: u32,
    },

    /// A raw pixel slice is too short for the declared geometry.
    #[error("pixel buffer too small: expected at least {expected} bytes, got {actual}")]
    InvalidBuffer {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes supplied.
        actual: usize,
    },
}

/// The reason a hash was rejected by [`crate::components`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidHashKind {
    /// Shorter than the 6-character minimum.
    #[error("hash too short: {actual} bytes (minimum 6)")]
    TooShort {
        /// Actual hash length in bytes.
        actual: usize,
    },

    /// The length does not match the declared component counts.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length implied by the size flag.
        expected: usize,
        /// Actual hash length in bytes.
        actual: usize,
    },

    /// The size flag decodes to component counts outside 1..=9.
    #[error("size flag decodes to {x}x{y} components")]
    ComponentsOutOfRange {
        /// Decoded horizontal components.
        x: u32,
        /// Decoded vertical components.
        y: u32,
    },
}

impl From<InvalidHashKind> for BlurhashError {
    fn from(kind: InvalidHashKind) -> Self {
        BlurhashError::InvalidHash(kind)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlurhashError>;
