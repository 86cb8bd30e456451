//! Value encoding/decoding for attribute payloads.
//!
//! Covers the plain per-kind layout. Large-object headers and encryption
//! wrap these payloads in [`codec::attribute`](super::attribute).

use crate::codec::primitives::{utf_length, Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_STRING_ATTR_LENGTH, NO_ZONE};
use crate::model::{AttributeKind, AttributeValue, Decimal, DecimalShape, Timestamp};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a value of `kind`. Blob and Clob read an `i32`-prefixed byte
/// array.
pub fn decode_value(reader: &mut Reader<'_>, kind: AttributeKind) -> Result<AttributeValue, DecodeError> {
    match kind {
        AttributeKind::Boolean => Ok(AttributeValue::Boolean(reader.read_bool("boolean value")?)),
        AttributeKind::Byte => Ok(AttributeValue::Byte(reader.read_byte("byte value")?)),
        AttributeKind::Char => decode_char(reader),
        AttributeKind::Short => Ok(AttributeValue::Short(reader.read_i16("short value")?)),
        AttributeKind::Integer => Ok(AttributeValue::Integer(reader.read_i32("integer value")?)),
        AttributeKind::Long => Ok(AttributeValue::Long(reader.read_i64("long value")?)),
        AttributeKind::Float => Ok(AttributeValue::Float(reader.read_f32("float value")?)),
        AttributeKind::Double => Ok(AttributeValue::Double(reader.read_f64("double value")?)),
        AttributeKind::Number => decode_number(reader),
        AttributeKind::String => Ok(AttributeValue::String(reader.read_utf("string value")?)),
        AttributeKind::Date => Ok(AttributeValue::Date(decode_timestamp(reader, kind)?)),
        AttributeKind::Time => Ok(AttributeValue::Time(decode_timestamp(reader, kind)?)),
        AttributeKind::TimeStamp => Ok(AttributeValue::TimeStamp(decode_timestamp(reader, kind)?)),
        AttributeKind::Blob => Ok(AttributeValue::Blob(reader.read_bytes_prefixed("blob value")?)),
        AttributeKind::Clob => Ok(AttributeValue::Clob(reader.read_bytes_prefixed("clob value")?)),
        AttributeKind::Invalid => Err(DecodeError::InvalidAttributeKind {
            value: AttributeKind::Invalid as u8,
        }),
    }
}

fn decode_char(reader: &mut Reader<'_>) -> Result<AttributeValue, DecodeError> {
    let unit = reader.read_u16("char value")?;
    char::from_u32(u32::from(unit))
        .map(AttributeValue::Char)
        .ok_or(DecodeError::InvalidCodeUnit { value: unit })
}

fn decode_number(reader: &mut Reader<'_>) -> Result<AttributeValue, DecodeError> {
    // The shape on the wire is recomputed from the text when stored.
    let _precision = reader.read_i16("number precision")?;
    let _scale = reader.read_i16("number scale")?;
    let text = reader.read_utf("number value")?;
    let decimal = text
        .parse::<Decimal>()
        .map_err(|_| DecodeError::InvalidDecimal { text })?;
    Ok(AttributeValue::Number(decimal))
}

fn decode_timestamp(reader: &mut Reader<'_>, kind: AttributeKind) -> Result<Timestamp, DecodeError> {
    let is_ad = reader.read_bool("timestamp era")?;
    let year_of_era = i32::from(reader.read_i16("timestamp year")?);
    let month = reader.read_byte("timestamp month")?;
    let day = reader.read_byte("timestamp day")?;
    let hour = reader.read_byte("timestamp hour")?;
    let minute = reader.read_byte("timestamp minute")?;
    let second = reader.read_byte("timestamp second")?;
    let millis = reader.read_u16("timestamp millis")?;
    let zone = reader.read_byte("timestamp zone type")?;
    let zone_id = if zone == NO_ZONE {
        None
    } else {
        Some(reader.read_i16("timestamp zone id")?)
    };

    let year = if is_ad { year_of_era } else { 1 - year_of_era };
    let timestamp = match kind {
        AttributeKind::Date => Timestamp::date(year, month, day),
        AttributeKind::Time => Timestamp::time(hour, minute, second, millis),
        _ => Timestamp::new(year, month, day, hour, minute, second, millis),
    };
    timestamp
        .map(|t| t.with_zone_id(zone_id))
        .ok_or(DecodeError::InvalidTimestamp { context: "timestamp value" })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes `value` in its plain layout. `shape` is the precision and scale
/// written ahead of a Number.
pub fn encode_value(
    writer: &mut Writer,
    value: &AttributeValue,
    shape: DecimalShape,
) -> Result<(), EncodeError> {
    match value {
        AttributeValue::Boolean(v) => writer.write_bool(*v),
        AttributeValue::Byte(v) => writer.write_byte(*v),
        // Stored chars are always inside the Basic Multilingual Plane.
        AttributeValue::Char(c) => writer.write_u16(*c as u32 as u16),
        AttributeValue::Short(v) => writer.write_i16(*v),
        AttributeValue::Integer(v) => writer.write_i32(*v),
        AttributeValue::Long(v) => writer.write_i64(*v),
        AttributeValue::Float(v) => writer.write_f32(*v),
        AttributeValue::Double(v) => writer.write_f64(*v),
        AttributeValue::Number(d) => {
            writer.write_i16(shape.precision);
            writer.write_i16(shape.scale);
            writer.write_utf(d.as_str(), "number value")?;
        }
        AttributeValue::String(s) => encode_string(writer, s)?,
        AttributeValue::Date(t) => encode_timestamp(writer, t, AttributeKind::Date),
        AttributeValue::Time(t) => encode_timestamp(writer, t, AttributeKind::Time),
        AttributeValue::TimeStamp(t) => encode_timestamp(writer, t, AttributeKind::TimeStamp),
        AttributeValue::Blob(bytes) => writer.write_bytes_prefixed(bytes, "blob value")?,
        AttributeValue::Clob(bytes) => writer.write_bytes_prefixed(bytes, "clob value")?,
    }
    Ok(())
}

fn encode_string(writer: &mut Writer, s: &str) -> Result<(), EncodeError> {
    let len = utf_length(s);
    if len > MAX_STRING_ATTR_LENGTH {
        return Err(EncodeError::StringTooLong {
            len,
            max: MAX_STRING_ATTR_LENGTH,
        });
    }
    writer.write_utf(s, "string value")
}

fn encode_timestamp(writer: &mut Writer, t: &Timestamp, kind: AttributeKind) {
    let (is_ad, year) = t.era_year();
    match kind {
        AttributeKind::Date => {
            writer.write_bool(is_ad);
            writer.write_i16(year);
            writer.write_byte(t.month());
            writer.write_byte(t.day());
            writer.write_bytes(&[0, 0, 0]);
            writer.write_u16(0);
        }
        AttributeKind::Time => {
            writer.write_bool(true);
            writer.write_i16(0);
            writer.write_bytes(&[0, 0]);
            writer.write_byte(t.hour());
            writer.write_byte(t.minute());
            writer.write_byte(t.second());
            writer.write_u16(t.millis());
        }
        _ => {
            writer.write_bool(is_ad);
            writer.write_i16(year);
            writer.write_byte(t.month());
            writer.write_byte(t.day());
            writer.write_byte(t.hour());
            writer.write_byte(t.minute());
            writer.write_byte(t.second());
            writer.write_u16(t.millis());
        }
    }
    match t.zone_id() {
        None => writer.write_byte(NO_ZONE),
        Some(id) => {
            writer.write_byte(0);
            writer.write_i16(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: AttributeValue) -> AttributeValue {
        let mut writer = Writer::new();
        encode_value(&mut writer, &value, DecimalShape::default()).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        let decoded = decode_value(&mut reader, value.kind()).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn test_representative_values() {
        let ts = Timestamp::new(2024, 2, 29, 13, 45, 7, 250).unwrap();
        let values = vec![
            AttributeValue::Boolean(true),
            AttributeValue::Boolean(false),
            AttributeValue::Byte(0),
            AttributeValue::Byte(255),
            AttributeValue::Char('é'),
            AttributeValue::Short(-1),
            AttributeValue::Integer(1),
            AttributeValue::Long(-1),
            AttributeValue::Float(-0.0),
            AttributeValue::Double(1.5e-300),
            AttributeValue::Number("-12.345678".parse().unwrap()),
            AttributeValue::String(String::new()),
            AttributeValue::String("x".to_string()),
            AttributeValue::String("a".repeat(MAX_STRING_ATTR_LENGTH)),
            AttributeValue::Date(ts.normalized_for(AttributeKind::Date)),
            AttributeValue::Time(ts.normalized_for(AttributeKind::Time)),
            AttributeValue::TimeStamp(ts),
            AttributeValue::Blob(Vec::new()),
            AttributeValue::Clob(vec![7u8; 40]),
        ];
        for value in values {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_string_bound() {
        let mut writer = Writer::new();
        let err = encode_value(
            &mut writer,
            &AttributeValue::String("a".repeat(MAX_STRING_ATTR_LENGTH + 1)),
            DecimalShape::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::StringTooLong { len: 998, max: 997 }));

        // Two-byte characters count twice.
        let err = encode_value(
            &mut writer,
            &AttributeValue::String("é".repeat(499)),
            DecimalShape::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::StringTooLong { len: 998, .. }));
    }

    #[test]
    fn test_number_layout() {
        let mut writer = Writer::new();
        let shape = DecimalShape {
            precision: 5,
            scale: 2,
        };
        encode_value(
            &mut writer,
            &AttributeValue::Number("123.45".parse().unwrap()),
            shape,
        )
        .unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[0, 5, 0, 2, 0, 6, b'1', b'2', b'3', b'.', b'4', b'5']
        );
    }

    #[test]
    fn test_date_layout_and_bc_years() {
        let date = Timestamp::date(-43, 3, 15).unwrap();
        let mut writer = Writer::new();
        encode_value(&mut writer, &AttributeValue::Date(date), DecimalShape::default()).unwrap();
        // era=BC, year of era 44, then zeroed clock and no zone.
        assert_eq!(writer.as_bytes(), &[0, 0, 44, 3, 15, 0, 0, 0, 0, 0, 0xFF]);
        assert_eq!(round_trip(AttributeValue::Date(date)), AttributeValue::Date(date));
    }

    #[test]
    fn test_zone_id_round_trip() {
        let ts = Timestamp::new(2001, 1, 1, 0, 0, 0, 0)
            .unwrap()
            .with_zone_id(Some(12));
        let decoded = round_trip(AttributeValue::TimeStamp(ts));
        assert_eq!(decoded.as_timestamp().unwrap().zone_id(), Some(12));
    }

    #[test]
    fn test_decode_errors() {
        let mut reader = Reader::new(&[0xD8, 0x00]);
        assert!(matches!(
            decode_value(&mut reader, AttributeKind::Char),
            Err(DecodeError::InvalidCodeUnit { value: 0xD800 })
        ));

        let mut reader = Reader::new(&[0, 0, 0, 0, 0, 3, b'a', b'b', b'c']);
        assert!(matches!(
            decode_value(&mut reader, AttributeKind::Number),
            Err(DecodeError::InvalidDecimal { .. })
        ));

        let mut reader = Reader::new(&[2]);
        assert!(matches!(
            decode_value(&mut reader, AttributeKind::Boolean),
            Err(DecodeError::InvalidBool { value: 2, .. })
        ));

        // Month 13.
        let mut reader = Reader::new(&[1, 0x07, 0xD0, 13, 1, 0, 0, 0, 0, 0, 0xFF]);
        assert!(matches!(
            decode_value(&mut reader, AttributeKind::Date),
            Err(DecodeError::InvalidTimestamp { .. })
        ));

        let mut reader = Reader::new(&[0, 0, 0]);
        assert!(matches!(
            decode_value(&mut reader, AttributeKind::Integer),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
