//! Protocol limits and fixed wire constants.

/// Largest encoded size of a String attribute value, in modified UTF-8 bytes.
///
/// The server reserves 1000 bytes per string slot: two for the length prefix
/// and one for its terminator.
pub const MAX_STRING_ATTR_LENGTH: usize = 1000 - 2 - 1;

/// Largest payload a `u16` length-prefixed UTF string can carry.
pub const MAX_UTF_LENGTH: usize = u16::MAX as usize;

/// Largest payload an `i32` length-prefixed byte array can carry.
pub const MAX_BYTES_LENGTH: usize = i32::MAX as usize;

/// Precision given to a freshly created Number descriptor.
pub const DEFAULT_DECIMAL_PRECISION: i16 = 20;

/// Scale given to a freshly created Number descriptor.
pub const DEFAULT_DECIMAL_SCALE: i16 = 5;

/// Time-zone byte meaning "no zone id follows".
pub const NO_ZONE: u8 = 0xFF;

/// Reserved attribute holding an entity's display name. Hidden from
/// attribute listings.
pub const RESERVED_NAME_ATTRIBUTE: &str = "@name";

/// Smallest encoded size of one attribute record (`id:i32` + `isNull:bool`).
pub(crate) const MIN_ATTRIBUTE_RECORD_BYTES: usize = 5;

/// Encoded size of one entity reference (`id:i64`).
pub(crate) const ENTITY_REFERENCE_BYTES: usize = 8;
