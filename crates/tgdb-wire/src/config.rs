//! Model configuration.

use crate::limits::{DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE};

/// Default pattern for date-time strings (`MM-dd-yyyy HH:mm:ss`).
pub const DEFAULT_DATETIME_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Options that shape value coercion and descriptor creation.
///
/// One instance lives on each [`GraphMetadata`](crate::GraphMetadata); every
/// entity created against that registry coerces its inputs with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    /// Pattern used to parse string inputs for Date, Time and TimeStamp
    /// attributes.
    ///
    /// Supported tokens: `%Y` (year), `%m` (month), `%d` (day), `%H` (hour),
    /// `%M` (minute), `%S` (second), `%L` (milliseconds) and `%%`. Any other
    /// character must match literally. When the pattern does not match, RFC
    /// 3339 date-time, date and time forms are tried before giving up.
    pub datetime_format: String,

    /// Precision of a newly created Number descriptor.
    pub decimal_precision: i16,

    /// Scale of a newly created Number descriptor.
    pub decimal_scale: i16,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            decimal_precision: DEFAULT_DECIMAL_PRECISION,
            decimal_scale: DEFAULT_DECIMAL_SCALE,
        }
    }
}

impl ModelOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the date-time pattern.
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    /// Replaces the initial shape of new Number descriptors.
    pub fn with_decimal_shape(mut self, precision: i16, scale: i16) -> Self {
        self.decimal_precision = precision;
        self.decimal_scale = scale;
        self
    }
}
