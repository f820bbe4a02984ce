//! Protocol error types.

use crate::ops::Tag;
use crate::record::FieldKind;
use thiserror::Error;

/// Errors that can occur during marshaling, unmarshaling, or dispatch.
///
/// All of these are reported to the immediate caller; nothing is swallowed
/// or logged-and-ignored inside the codec. Whether to retry, disconnect, or
/// degrade is the transport's or handler's decision.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The wire bytes do not decode as the expected primitives: a declared
    /// length exceeds the available bytes, a fixed-width read is truncated,
    /// a string is not valid UTF-8, or bytes are left over after a record
    /// claims to be fully decoded. The stream should be treated as
    /// desynchronized.
    #[error("malformed wire data: {reason}")]
    MalformedWireData { reason: String },

    /// No record type is registered for the tag. Expected under protocol
    /// version skew between peers; recoverable, never fatal to the
    /// dispatcher.
    #[error("unknown operation tag: {0}")]
    UnknownTag(Tag),

    /// A required key is absent from a mapping representation.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A structured value has the wrong kind for its field. No implicit
    /// coercion is performed.
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: &'static str,
        expected: FieldKind,
        actual: FieldKind,
    },

    /// A sequence representation does not have exactly one value per field.
    #[error("arity mismatch for {kind}: expected {expected} values, got {actual}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Two operation types claim the same wire tag. Registration happens
    /// once at startup, so this is a configuration error and fatal there.
    #[error("duplicate tag registration: {0}")]
    DuplicateTag(Tag),
}
