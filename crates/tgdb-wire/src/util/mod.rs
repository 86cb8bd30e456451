//! Utility modules.

pub mod datetime;

pub use datetime::{
    format_datetime_rfc3339, format_with_pattern, parse_datetime, parse_with_pattern,
    DateTimeParseError, DateTimeParts,
};
