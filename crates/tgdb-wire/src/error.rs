//! Error types for the entity model and its wire codec.
//!
//! Failures fall into three caller-visible classes (see [`ErrorKind`]):
//! type coercion, I/O (stream and encoding failures), and schema. Each class
//! has its own enum so call sites can match precisely; [`Error`] wraps them
//! all for `?` propagation across layers.

use thiserror::Error;

use crate::model::{AttributeKind, EntityKind};

/// Caller-visible error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value could not be coerced into an attribute's kind. The attribute
    /// keeps its previous value.
    TypeCoercion,
    /// Stream truncation, malformed bytes, an oversize string, or a failure
    /// reported by the connection collaborator.
    Io,
    /// Missing or invalid schema information.
    Schema,
}

impl ErrorKind {
    /// Returns a short stable code for this class (e.g. "E-COERCE").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::TypeCoercion => "E-COERCE",
            ErrorKind::Io => "E-IO",
            ErrorKind::Schema => "E-SCHEMA",
        }
    }
}

/// A value of the wrong shape was assigned to an attribute.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("{kind:?} attribute does not accept {input} values")]
    UnsupportedInput {
        kind: AttributeKind,
        input: &'static str,
    },

    #[error("cannot parse {text:?} as {kind:?}")]
    Unparseable { kind: AttributeKind, text: String },

    #[error("{value} is out of range for {kind:?}")]
    OutOfRange { kind: AttributeKind, value: String },
}

/// Error while reading the wire format.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("invalid bool value {value} in {context} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8, context: &'static str },

    #[error("invalid entity kind byte: {value}")]
    InvalidEntityKind { value: u8 },

    #[error("invalid attribute kind byte: {value}")]
    InvalidAttributeKind { value: u8 },

    #[error("invalid system type byte {value} in {context}")]
    InvalidSystemType { value: u8, context: &'static str },

    #[error("entity {id} was referenced as {expected:?} but the stream holds a {found:?}")]
    EntityKindMismatch {
        id: i64,
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("stream entry announced entity {expected} but its frame carries {found}")]
    EntityIdMismatch { expected: i64, found: i64 },

    #[error("entity frame declared {declared} bytes but {consumed} were consumed")]
    FrameLengthMismatch { declared: usize, consumed: usize },

    #[error("negative length {len} for {field}")]
    NegativeLength { field: &'static str, len: i64 },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("malformed modified UTF-8 in {field}")]
    MalformedUtf { field: &'static str },

    #[error("code unit {value:#06x} is not a valid character")]
    InvalidCodeUnit { value: u16 },

    #[error("invalid decimal text {text:?}")]
    InvalidDecimal { text: String },

    #[error("invalid calendar value in {context}")]
    InvalidTimestamp { context: &'static str },
}

/// Error while writing the wire format.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("UTF length {len} of String exceeds the maximum {max} supported for a String attribute")]
    StringTooLong { len: usize, max: usize },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} {id} does not fit the 32-bit wire field")]
    IdOutOfRange { field: &'static str, id: i64 },

    #[error("edge {edge} has no {end} node")]
    MissingEndpoint { edge: i64, end: &'static str },

    #[error("cannot patch 4 bytes at position {pos}, only {len} bytes written")]
    InvalidPatchPosition { pos: usize, len: usize },
}

/// Missing or inconsistent schema information.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("attribute descriptor has no name")]
    UnnamedDescriptor,

    #[error("invalid attribute kind {value}")]
    InvalidAttributeKind { value: u8 },

    #[error("invalid attribute id {id} encountered while decoding")]
    UnknownAttributeId { id: i64 },

    #[error("no attribute type is registered for type name {name:?}")]
    UnknownTypeName { name: String },

    #[error("entity has no attribute named {name:?}")]
    UnknownAttribute { name: String },

    #[error("attribute {name:?} is a {kind:?}, not a large object")]
    NotLargeObject { name: String, kind: AttributeKind },

    #[error("key attribute {name:?} cannot be null")]
    NullKeyValue { name: String },

    #[error("edge {end} endpoint is not a node in this arena")]
    InvalidEndpoint { end: &'static str },

    #[error("no entity with handle {index} in this arena")]
    UnknownHandle { index: usize },

    #[error("cannot create an entity of kind {kind:?}")]
    UnsupportedEntityKind { kind: EntityKind },

    #[error("{operation} requires a connection but the graph metadata has none")]
    MissingConnection { operation: &'static str },
}

/// Failure reported by the connection collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("large object {id} could not be fetched: {reason}")]
    LargeObject { id: i64, reason: String },
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Coercion(_) => ErrorKind::TypeCoercion,
            Error::Decode(_) | Error::Encode(_) | Error::Connection(_) => ErrorKind::Io,
            Error::Schema(_) => ErrorKind::Schema,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let coercion: Error = CoercionError::UnsupportedInput {
            kind: AttributeKind::Boolean,
            input: "double",
        }
        .into();
        assert_eq!(coercion.kind(), ErrorKind::TypeCoercion);

        let oversize: Error = EncodeError::StringTooLong { len: 998, max: 997 }.into();
        assert_eq!(oversize.kind(), ErrorKind::Io);

        let lost: Error = ConnectionError::Decryption("bad key".to_string()).into();
        assert_eq!(lost.kind(), ErrorKind::Io);

        let schema: Error = SchemaError::UnknownAttributeId { id: 7 }.into();
        assert_eq!(schema.kind(), ErrorKind::Schema);
        assert_eq!(schema.kind().code(), "E-SCHEMA");
    }

    #[test]
    fn test_messages_are_readable() {
        let err = Error::from(SchemaError::UnknownAttributeId { id: 12 });
        assert_eq!(
            err.to_string(),
            "invalid attribute id 12 encountered while decoding"
        );
    }
}
