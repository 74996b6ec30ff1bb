//! Bytecode error types.

use thiserror::Error;

/// Errors raised while writing or reading class files and Kotlin metadata.
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// The constant pool would exceed 65535 slots.
    #[error("constant pool overflow: more than 65535 slots")]
    ConstantPoolOverflow,

    /// A length-prefixed structure does not fit its length field.
    #[error("{what} too large: {len} bytes")]
    AttributeTooLarge {
        /// The structure that overflowed.
        what: &'static str,
        /// Its actual length.
        len: usize,
    },

    /// Input ended in the middle of a structure.
    #[error("unexpected end of input while reading {0}")]
    Truncated(&'static str),

    /// Input is structurally invalid.
    #[error("malformed {what}: {message}")]
    Malformed {
        /// The structure being decoded.
        what: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// A constant pool tag this reader does not understand.
    #[error("unsupported constant pool tag {0}")]
    UnsupportedConstant(u8),

    /// A string is not valid modified UTF-8.
    #[error("invalid modified UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// The class carries no `kotlin.Metadata` annotation.
    #[error("class has no kotlin.Metadata annotation")]
    MissingMetadata,

    /// The metadata kind does not match what the reader expects.
    #[error("unexpected metadata kind {found}, expected {expected}")]
    UnexpectedKind {
        /// Kind the reader supports.
        expected: i32,
        /// Kind found in the header.
        found: i32,
    },
}

impl BytecodeError {
    pub(crate) fn malformed(what: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            message: message.into(),
        }
    }
}

/// Result type for bytecode operations.
pub type BytecodeResult<T> = Result<T, BytecodeError>;
