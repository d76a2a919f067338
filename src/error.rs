//! Crate-wide error type.
//!
//! Every fallible operation in the collection engines, the string engine, and
//! the format compiler reports through [`Error`]. The engines never recover
//! internally; a partial mutation that would break an invariant on the error
//! path is rolled back before the error is returned.

use core::fmt;

/// Errors raised by the collection, text, and parsing engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup or removal demanded a key that is not in the map.
    BadKey,
    /// A cursor was used after a mutation invalidated it, or advanced past
    /// the end of its owner.
    IteratorInvalidated,
    /// An index fell outside `[0, size)` (or `[0, size]` where an end
    /// position is allowed).
    OutOfRange,
    /// The allocator refused a request.
    OutOfMemory,
    /// Transcoding encountered an invalid code-unit sequence in strict mode.
    EncodingError,
    /// The format-string compiler saw unexpected or missing syntax, or the
    /// input text did not match the compiled format.
    Syntax {
        /// What was wrong.
        description: &'static str,
        /// The offending expression or input, if available.
        expression: String,
        /// 1-based character index of the problem within `expression`.
        char_index: usize,
    },
    /// A type descriptor was asked for an operation it does not carry.
    UnsupportedOperation,
    /// An externally supplied pointer failed the alignment contract.
    BadAlignment,
}

impl Error {
    /// Stable identifier string for the error kind.
    pub fn error_name(&self) -> &'static str {
        match self {
            Error::BadKey => "bad_key",
            Error::IteratorInvalidated => "iterator_invalidated",
            Error::OutOfRange => "out_of_range",
            Error::OutOfMemory => "out_of_memory",
            Error::EncodingError => "encoding_error",
            Error::Syntax { .. } => "syntax_error",
            Error::UnsupportedOperation => "unsupported_operation",
            Error::BadAlignment => "bad_alignment",
        }
    }

}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadKey => f.write_str("key not found in map"),
            Error::IteratorInvalidated => f.write_str("iterator invalidated by a mutation"),
            Error::OutOfRange => f.write_str("index out of range"),
            Error::OutOfMemory => f.write_str("memory allocation failed"),
            Error::EncodingError => f.write_str("invalid code-unit sequence"),
            Error::Syntax {
                description,
                expression,
                char_index,
            } => {
                if expression.is_empty() {
                    write!(f, "syntax error: {description}")
                } else {
                    write!(
                        f,
                        "syntax error: {description} in \u{201c}{expression}\u{201d} at character {char_index}"
                    )
                }
            }
            Error::UnsupportedOperation => f.write_str("type descriptor lacks a required operation"),
            Error::BadAlignment => f.write_str("pointer does not satisfy the alignment contract"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_name_strings() {
        assert_eq!(Error::BadKey.error_name(), "bad_key");
        assert_eq!(Error::IteratorInvalidated.error_name(), "iterator_invalidated");
        assert_eq!(Error::OutOfRange.error_name(), "out_of_range");
        assert_eq!(Error::OutOfMemory.error_name(), "out_of_memory");
        assert_eq!(Error::EncodingError.error_name(), "encoding_error");
        let syntax = Error::Syntax {
            description: "x",
            expression: String::new(),
            char_index: 0,
        };
        assert_eq!(syntax.error_name(), "syntax_error");
        assert_eq!(Error::UnsupportedOperation.error_name(), "unsupported_operation");
        assert_eq!(Error::BadAlignment.error_name(), "bad_alignment");
    }

    #[test]
    fn syntax_display_includes_position() {
        let err = Error::Syntax {
            description: "unexpected character",
            expression: "#bq".to_string(),
            char_index: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("unexpected character"));
        assert!(msg.contains("#bq"));
        assert!(msg.contains('3'));
    }
}
