//! Attribute values and the per-kind coercion rules.
//!
//! [`AttributeValue`] is what an attribute stores: exactly one typed payload
//! per [`AttributeKind`]. [`ValueInput`] is what callers hand in; it is
//! coerced into the stored form by [`coerce`] according to the target kind.

use std::borrow::Cow;

use crate::codec::primitives::utf_length;
use crate::config::ModelOptions;
use crate::error::{CoercionError, EncodeError, Error};
use crate::limits::MAX_STRING_ATTR_LENGTH;
use crate::model::{AttributeKind, Decimal, Timestamp};

/// A stored attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Boolean(bool),
    Byte(u8),
    /// A single UTF-16 code unit; always in the Basic Multilingual Plane.
    Char(char),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Number(Decimal),
    String(String),
    Date(Timestamp),
    Time(Timestamp),
    TimeStamp(Timestamp),
    Blob(Vec<u8>),
    /// Character data stored as raw bytes.
    Clob(Vec<u8>),
}

impl AttributeValue {
    /// Returns the kind this payload belongs to.
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Boolean(_) => AttributeKind::Boolean,
            AttributeValue::Byte(_) => AttributeKind::Byte,
            AttributeValue::Char(_) => AttributeKind::Char,
            AttributeValue::Short(_) => AttributeKind::Short,
            AttributeValue::Integer(_) => AttributeKind::Integer,
            AttributeValue::Long(_) => AttributeKind::Long,
            AttributeValue::Float(_) => AttributeKind::Float,
            AttributeValue::Double(_) => AttributeKind::Double,
            AttributeValue::Number(_) => AttributeKind::Number,
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Date(_) => AttributeKind::Date,
            AttributeValue::Time(_) => AttributeKind::Time,
            AttributeValue::TimeStamp(_) => AttributeKind::TimeStamp,
            AttributeValue::Blob(_) => AttributeKind::Blob,
            AttributeValue::Clob(_) => AttributeKind::Clob,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integer payload widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Byte(v) => Some(i64::from(*v)),
            AttributeValue::Short(v) => Some(i64::from(*v)),
            AttributeValue::Integer(v) => Some(i64::from(*v)),
            AttributeValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any floating-point payload widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(f64::from(*v)),
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            AttributeValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            AttributeValue::Date(v) | AttributeValue::Time(v) | AttributeValue::TimeStamp(v) => {
                Some(v)
            }
            _ => None,
        }
    }

    /// Returns the bytes of a Blob or Clob.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Blob(v) | AttributeValue::Clob(v) => Some(v),
            _ => None,
        }
    }
}

/// A caller-supplied value, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput<'a> {
    Null,
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Decimal(Decimal),
    Timestamp(Timestamp),
}

impl ValueInput<'_> {
    /// Short name of the input shape, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ValueInput::Null => "null",
            ValueInput::Bool(_) => "bool",
            ValueInput::Byte(_) => "u8",
            ValueInput::Short(_) => "i16",
            ValueInput::Int(_) => "i32",
            ValueInput::Long(_) => "i64",
            ValueInput::Float(_) => "f32",
            ValueInput::Double(_) => "f64",
            ValueInput::Char(_) => "char",
            ValueInput::Text(_) => "string",
            ValueInput::Bytes(_) => "bytes",
            ValueInput::Decimal(_) => "decimal",
            ValueInput::Timestamp(_) => "timestamp",
        }
    }

    /// The attribute kind a descriptor should get when it is created from
    /// this input alone. Null carries no shape and maps to String.
    pub fn inferred_kind(&self) -> AttributeKind {
        match self {
            ValueInput::Null | ValueInput::Text(_) => AttributeKind::String,
            ValueInput::Bool(_) => AttributeKind::Boolean,
            ValueInput::Byte(_) => AttributeKind::Byte,
            ValueInput::Short(_) => AttributeKind::Short,
            ValueInput::Int(_) => AttributeKind::Integer,
            ValueInput::Long(_) => AttributeKind::Long,
            ValueInput::Float(_) => AttributeKind::Float,
            ValueInput::Double(_) => AttributeKind::Double,
            ValueInput::Char(_) => AttributeKind::Char,
            ValueInput::Bytes(_) => AttributeKind::Blob,
            ValueInput::Decimal(_) => AttributeKind::Number,
            ValueInput::Timestamp(_) => AttributeKind::TimeStamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueInput::Null)
    }
}

macro_rules! impl_from_input {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ValueInput<'_> {
                fn from(value: $ty) -> Self {
                    ValueInput::$variant(value)
                }
            }
        )*
    };
}

impl_from_input! {
    bool => Bool,
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    Decimal => Decimal,
    Timestamp => Timestamp,
}

impl<'a> From<&'a str> for ValueInput<'a> {
    fn from(value: &'a str) -> Self {
        ValueInput::Text(Cow::Borrowed(value))
    }
}

impl From<String> for ValueInput<'_> {
    fn from(value: String) -> Self {
        ValueInput::Text(Cow::Owned(value))
    }
}

impl<'a> From<&'a [u8]> for ValueInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        ValueInput::Bytes(Cow::Borrowed(value))
    }
}

impl From<Vec<u8>> for ValueInput<'_> {
    fn from(value: Vec<u8>) -> Self {
        ValueInput::Bytes(Cow::Owned(value))
    }
}

impl<'a, T: Into<ValueInput<'a>>> From<Option<T>> for ValueInput<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(ValueInput::Null, Into::into)
    }
}

impl From<AttributeValue> for ValueInput<'_> {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Boolean(v) => ValueInput::Bool(v),
            AttributeValue::Byte(v) => ValueInput::Byte(v),
            AttributeValue::Char(v) => ValueInput::Char(v),
            AttributeValue::Short(v) => ValueInput::Short(v),
            AttributeValue::Integer(v) => ValueInput::Int(v),
            AttributeValue::Long(v) => ValueInput::Long(v),
            AttributeValue::Float(v) => ValueInput::Float(v),
            AttributeValue::Double(v) => ValueInput::Double(v),
            AttributeValue::Number(v) => ValueInput::Decimal(v),
            AttributeValue::String(v) => ValueInput::Text(Cow::Owned(v)),
            AttributeValue::Date(v) | AttributeValue::Time(v) | AttributeValue::TimeStamp(v) => {
                ValueInput::Timestamp(v)
            }
            AttributeValue::Blob(v) | AttributeValue::Clob(v) => ValueInput::Bytes(Cow::Owned(v)),
        }
    }
}

// =============================================================================
// COERCION
// =============================================================================

/// Coerces `input` into a value of `kind`.
///
/// Returns `Ok(None)` for [`ValueInput::Null`]. A String longer than the
/// server's slot fails with an I/O-class [`EncodeError::StringTooLong`];
/// every other rejection is a [`CoercionError`].
pub fn coerce(
    kind: AttributeKind,
    input: ValueInput<'_>,
    options: &ModelOptions,
) -> Result<Option<AttributeValue>, Error> {
    if input.is_null() {
        return Ok(None);
    }
    let value = match kind {
        AttributeKind::Boolean => AttributeValue::Boolean(coerce_bool(input)?),
        AttributeKind::Byte => AttributeValue::Byte(coerce_byte(input)?),
        AttributeKind::Char => AttributeValue::Char(coerce_char(input)?),
        AttributeKind::Short => AttributeValue::Short(coerce_short(input)?),
        AttributeKind::Integer => AttributeValue::Integer(coerce_integer(input)?),
        AttributeKind::Long => AttributeValue::Long(coerce_long(input)?),
        AttributeKind::Float => AttributeValue::Float(coerce_float(input)?),
        AttributeKind::Double => AttributeValue::Double(coerce_double(input)?),
        AttributeKind::Number => AttributeValue::Number(coerce_number(input)?),
        AttributeKind::String => AttributeValue::String(coerce_string(input)?),
        AttributeKind::Date => AttributeValue::Date(coerce_timestamp(kind, input, options)?),
        AttributeKind::Time => AttributeValue::Time(coerce_timestamp(kind, input, options)?),
        AttributeKind::TimeStamp => {
            AttributeValue::TimeStamp(coerce_timestamp(kind, input, options)?)
        }
        AttributeKind::Blob => AttributeValue::Blob(coerce_large_object(kind, input)?),
        AttributeKind::Clob => AttributeValue::Clob(coerce_large_object(kind, input)?),
        AttributeKind::Invalid => return Err(unsupported(kind, &input).into()),
    };
    Ok(Some(value))
}

fn unsupported(kind: AttributeKind, input: &ValueInput<'_>) -> CoercionError {
    CoercionError::UnsupportedInput {
        kind,
        input: input.describe(),
    }
}

fn unparseable(kind: AttributeKind, text: &str) -> CoercionError {
    CoercionError::Unparseable {
        kind,
        text: text.to_string(),
    }
}

fn out_of_range(kind: AttributeKind, value: impl ToString) -> CoercionError {
    CoercionError::OutOfRange {
        kind,
        value: value.to_string(),
    }
}

/// Integer inputs widened to `i64`, or `None` for other shapes.
fn integral(input: &ValueInput<'_>) -> Option<i64> {
    match input {
        ValueInput::Byte(v) => Some(i64::from(*v)),
        ValueInput::Short(v) => Some(i64::from(*v)),
        ValueInput::Int(v) => Some(i64::from(*v)),
        ValueInput::Long(v) => Some(*v),
        _ => None,
    }
}

fn parse_bool_text(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn coerce_bool(input: ValueInput<'_>) -> Result<bool, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Boolean;
    match input {
        ValueInput::Bool(v) => Ok(v),
        ValueInput::Text(s) => parse_bool_text(&s).ok_or_else(|| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_byte(input: ValueInput<'_>) -> Result<u8, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Byte;
    match input {
        ValueInput::Bool(v) => Ok(u8::from(v)),
        ValueInput::Byte(v) => Ok(v),
        ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            let v = integral(&input).unwrap_or_default();
            u8::try_from(v).map_err(|_| out_of_range(KIND, v))
        }
        ValueInput::Float(v) => float_to_byte(f64::from(v)),
        ValueInput::Double(v) => float_to_byte(v),
        ValueInput::Char(c) => u8::try_from(u32::from(c)).map_err(|_| out_of_range(KIND, c)),
        ValueInput::Text(s) => {
            let v: i64 = s.trim().parse().map_err(|_| unparseable(KIND, &s))?;
            u8::try_from(v).map_err(|_| out_of_range(KIND, v))
        }
        other => Err(unsupported(KIND, &other)),
    }
}

fn float_to_byte(v: f64) -> Result<u8, CoercionError> {
    if v.is_finite() && (0.0..256.0).contains(&v) {
        Ok(v as u8)
    } else {
        Err(out_of_range(AttributeKind::Byte, v))
    }
}

/// Returns `c` if it fits in one UTF-16 code unit.
fn bmp_char(c: char) -> Result<char, CoercionError> {
    if u32::from(c) <= 0xFFFF {
        Ok(c)
    } else {
        Err(out_of_range(AttributeKind::Char, c.escape_unicode()))
    }
}

fn code_point_char(v: i64) -> Result<char, CoercionError> {
    u32::try_from(v)
        .ok()
        .filter(|cp| *cp <= 0xFFFF)
        .and_then(char::from_u32)
        .ok_or_else(|| out_of_range(AttributeKind::Char, v))
}

fn coerce_char(input: ValueInput<'_>) -> Result<char, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Char;
    match input {
        ValueInput::Char(c) => bmp_char(c),
        ValueInput::Byte(v) => Ok(char::from(v)),
        ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            code_point_char(integral(&input).unwrap_or_default())
        }
        ValueInput::Text(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => bmp_char(c),
                _ => {
                    let v: i16 = s.trim().parse().map_err(|_| unparseable(KIND, &s))?;
                    code_point_char(i64::from(v))
                }
            }
        }
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_short(input: ValueInput<'_>) -> Result<i16, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Short;
    match input {
        ValueInput::Byte(_) | ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            let v = integral(&input).unwrap_or_default();
            i16::try_from(v).map_err(|_| out_of_range(KIND, v))
        }
        ValueInput::Text(s) => s.trim().parse().map_err(|_| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_integer(input: ValueInput<'_>) -> Result<i32, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Integer;
    match input {
        ValueInput::Byte(_) | ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            let v = integral(&input).unwrap_or_default();
            i32::try_from(v).map_err(|_| out_of_range(KIND, v))
        }
        ValueInput::Text(s) => s.trim().parse().map_err(|_| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_long(input: ValueInput<'_>) -> Result<i64, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Long;
    match input {
        ValueInput::Byte(_) | ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            Ok(integral(&input).unwrap_or_default())
        }
        ValueInput::Text(s) => s.trim().parse().map_err(|_| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_float(input: ValueInput<'_>) -> Result<f32, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Float;
    match input {
        ValueInput::Float(v) => Ok(v),
        ValueInput::Double(v) => {
            let narrowed = v as f32;
            if v.is_finite() && narrowed.is_infinite() {
                Err(out_of_range(KIND, v))
            } else {
                Ok(narrowed)
            }
        }
        ValueInput::Byte(_) | ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            Ok(integral(&input).unwrap_or_default() as f32)
        }
        ValueInput::Text(s) => s.trim().parse().map_err(|_| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_double(input: ValueInput<'_>) -> Result<f64, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Double;
    match input {
        ValueInput::Float(v) => Ok(f64::from(v)),
        ValueInput::Double(v) => Ok(v),
        ValueInput::Byte(_) | ValueInput::Short(_) | ValueInput::Int(_) | ValueInput::Long(_) => {
            Ok(integral(&input).unwrap_or_default() as f64)
        }
        ValueInput::Text(s) => s.trim().parse().map_err(|_| unparseable(KIND, &s)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_number(input: ValueInput<'_>) -> Result<Decimal, CoercionError> {
    const KIND: AttributeKind = AttributeKind::Number;
    match input {
        ValueInput::Decimal(d) => Ok(d),
        ValueInput::Text(s) => Decimal::parse(&s).map_err(|_| unparseable(KIND, &s)),
        ValueInput::Int(v) => Ok(Decimal::from(v)),
        ValueInput::Long(v) => Ok(Decimal::from(v)),
        ValueInput::Float(v) => Decimal::from_f64(f64::from(v)).ok_or_else(|| out_of_range(KIND, v)),
        ValueInput::Double(v) => Decimal::from_f64(v).ok_or_else(|| out_of_range(KIND, v)),
        other => Err(unsupported(KIND, &other)),
    }
}

fn coerce_string(input: ValueInput<'_>) -> Result<String, Error> {
    match input {
        ValueInput::Text(s) => {
            let len = utf_length(&s);
            if len > MAX_STRING_ATTR_LENGTH {
                return Err(EncodeError::StringTooLong {
                    len,
                    max: MAX_STRING_ATTR_LENGTH,
                }
                .into());
            }
            Ok(s.into_owned())
        }
        other => Err(unsupported(AttributeKind::String, &other).into()),
    }
}

fn coerce_timestamp(
    kind: AttributeKind,
    input: ValueInput<'_>,
    options: &ModelOptions,
) -> Result<Timestamp, CoercionError> {
    let ts = match input {
        ValueInput::Timestamp(ts) => ts,
        ValueInput::Text(s) => Timestamp::parse(&s, &options.datetime_format)
            .ok_or_else(|| unparseable(kind, &s))?,
        ValueInput::Int(_) | ValueInput::Long(_) => {
            let seconds = integral(&input).unwrap_or_default();
            Timestamp::from_epoch_seconds(seconds).ok_or_else(|| out_of_range(kind, seconds))?
        }
        other => return Err(unsupported(kind, &other)),
    };
    Ok(ts.normalized_for(kind))
}

fn coerce_large_object(kind: AttributeKind, input: ValueInput<'_>) -> Result<Vec<u8>, CoercionError> {
    match input {
        ValueInput::Bytes(b) => Ok(b.into_owned()),
        ValueInput::Text(s) => Ok(s.into_owned().into_bytes()),
        ValueInput::Float(v) => Ok(v.to_be_bytes().to_vec()),
        ValueInput::Double(v) => Ok(v.to_be_bytes().to_vec()),
        other => Err(unsupported(kind, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn coerce_default(kind: AttributeKind, input: impl Into<ValueInput<'static>>) -> Result<Option<AttributeValue>, Error> {
        coerce(kind, input.into(), &ModelOptions::default())
    }

    #[test]
    fn test_null_is_always_accepted() {
        for kind in AttributeKind::ALL {
            assert_eq!(coerce_default(kind, ValueInput::Null).unwrap(), None);
        }
    }

    #[test]
    fn test_boolean() {
        assert_eq!(
            coerce_default(AttributeKind::Boolean, true).unwrap(),
            Some(AttributeValue::Boolean(true))
        );
        assert_eq!(
            coerce_default(AttributeKind::Boolean, "F").unwrap(),
            Some(AttributeValue::Boolean(false))
        );
        assert!(matches!(
            coerce_default(AttributeKind::Boolean, "yes"),
            Err(Error::Coercion(CoercionError::Unparseable { .. }))
        ));
        assert!(matches!(
            coerce_default(AttributeKind::Boolean, 1.0f64),
            Err(Error::Coercion(CoercionError::UnsupportedInput { input: "f64", .. }))
        ));
    }

    #[test]
    fn test_byte() {
        assert_eq!(
            coerce_default(AttributeKind::Byte, true).unwrap(),
            Some(AttributeValue::Byte(1))
        );
        assert_eq!(
            coerce_default(AttributeKind::Byte, " 65 ").unwrap(),
            Some(AttributeValue::Byte(65))
        );
        assert_eq!(
            coerce_default(AttributeKind::Byte, 200i32).unwrap(),
            Some(AttributeValue::Byte(200))
        );
        assert!(matches!(
            coerce_default(AttributeKind::Byte, 300i32),
            Err(Error::Coercion(CoercionError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_char() {
        assert_eq!(
            coerce_default(AttributeKind::Char, "é").unwrap(),
            Some(AttributeValue::Char('é'))
        );
        assert_eq!(
            coerce_default(AttributeKind::Char, 65i32).unwrap(),
            Some(AttributeValue::Char('A'))
        );
        assert_eq!(
            coerce_default(AttributeKind::Char, "66").unwrap(),
            Some(AttributeValue::Char('B'))
        );
        assert!(coerce_default(AttributeKind::Char, '\u{1F600}').is_err());
        assert!(coerce_default(AttributeKind::Char, 0xD800i32).is_err());
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            coerce_default(AttributeKind::Short, "-12").unwrap(),
            Some(AttributeValue::Short(-12))
        );
        assert!(matches!(
            coerce_default(AttributeKind::Short, 40_000i32),
            Err(Error::Coercion(CoercionError::OutOfRange { .. }))
        ));
        assert_eq!(
            coerce_default(AttributeKind::Integer, 7i16).unwrap(),
            Some(AttributeValue::Integer(7))
        );
        assert_eq!(
            coerce_default(AttributeKind::Long, "9000000000").unwrap(),
            Some(AttributeValue::Long(9_000_000_000))
        );
        let err = coerce_default(AttributeKind::Integer, "12abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
        assert!(coerce_default(AttributeKind::Long, 1.5f64).is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(
            coerce_default(AttributeKind::Float, "1.25").unwrap(),
            Some(AttributeValue::Float(1.25))
        );
        assert_eq!(
            coerce_default(AttributeKind::Double, 1.5f32).unwrap(),
            Some(AttributeValue::Double(1.5))
        );
        assert!(coerce_default(AttributeKind::Float, f64::MAX).is_err());
        assert!(coerce_default(AttributeKind::Double, "NaNx").is_err());
    }

    #[test]
    fn test_number() {
        let v = coerce_default(AttributeKind::Number, "123.45").unwrap().unwrap();
        assert_eq!(v.as_decimal().unwrap().as_str(), "123.45");

        let v = coerce_default(AttributeKind::Number, 42i64).unwrap().unwrap();
        assert_eq!(v.as_decimal().unwrap().scale(), 0);

        let v = coerce_default(AttributeKind::Number, 0.5f64).unwrap().unwrap();
        assert_eq!(v.as_decimal().unwrap().as_str(), "0.500000");

        assert!(coerce_default(AttributeKind::Number, f64::NAN).is_err());
        assert!(coerce_default(AttributeKind::Number, true).is_err());
        assert!(coerce_default(AttributeKind::Number, "12,5").is_err());
    }

    #[test]
    fn test_string_bound() {
        let ok = "a".repeat(MAX_STRING_ATTR_LENGTH);
        assert!(coerce_default(AttributeKind::String, ok).is_ok());

        let too_long = "a".repeat(MAX_STRING_ATTR_LENGTH + 1);
        let err = coerce_default(AttributeKind::String, too_long).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::StringTooLong { len: 998, max: 997 })
        ));
        assert_eq!(err.kind(), ErrorKind::Io);

        assert!(matches!(
            coerce_default(AttributeKind::String, 5i32),
            Err(Error::Coercion(_))
        ));
    }

    #[test]
    fn test_string_bound_counts_encoded_bytes() {
        // 499 two-byte characters is 998 encoded bytes.
        let s = "é".repeat(499);
        assert!(coerce_default(AttributeKind::String, s).is_err());
    }

    #[test]
    fn test_temporal_kinds_normalize() {
        let v = coerce_default(AttributeKind::Date, "07-04-2021 13:05:09").unwrap().unwrap();
        assert_eq!(v, AttributeValue::Date(Timestamp::date(2021, 7, 4).unwrap()));

        let v = coerce_default(AttributeKind::Time, "07-04-2021 13:05:09").unwrap().unwrap();
        assert_eq!(v, AttributeValue::Time(Timestamp::time(13, 5, 9, 0).unwrap()));

        let v = coerce_default(AttributeKind::TimeStamp, 0i64).unwrap().unwrap();
        assert_eq!(
            v,
            AttributeValue::TimeStamp(Timestamp::new(1970, 1, 1, 0, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_custom_datetime_format() {
        let options = ModelOptions::new().with_datetime_format("%Y%m%d");
        let v = coerce(AttributeKind::Date, "20200229".into(), &options).unwrap().unwrap();
        assert_eq!(v, AttributeValue::Date(Timestamp::date(2020, 2, 29).unwrap()));
    }

    #[test]
    fn test_large_objects() {
        assert_eq!(
            coerce_default(AttributeKind::Blob, vec![1u8, 2, 3]).unwrap(),
            Some(AttributeValue::Blob(vec![1, 2, 3]))
        );
        assert_eq!(
            coerce_default(AttributeKind::Clob, "hi").unwrap(),
            Some(AttributeValue::Clob(b"hi".to_vec()))
        );
        assert_eq!(
            coerce_default(AttributeKind::Blob, 1.0f64).unwrap(),
            Some(AttributeValue::Blob(1.0f64.to_be_bytes().to_vec()))
        );
        assert!(coerce_default(AttributeKind::Blob, 1i32).is_err());
    }

    #[test]
    fn test_inferred_kind() {
        assert_eq!(ValueInput::from(3i64).inferred_kind(), AttributeKind::Long);
        assert_eq!(ValueInput::from("x").inferred_kind(), AttributeKind::String);
        assert_eq!(ValueInput::from(None::<i32>).inferred_kind(), AttributeKind::String);
        assert_eq!(ValueInput::from(vec![0u8]).inferred_kind(), AttributeKind::Blob);
    }
}
