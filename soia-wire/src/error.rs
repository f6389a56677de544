//! Wire-level error types.

use thiserror::Error;

/// Errors raised while reading the binary wire format.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid wire byte {wire:#04x} at offset {offset}")]
    InvalidWire { wire: u8, offset: usize },

    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,
}
