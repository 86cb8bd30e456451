//! Primitive encoding/decoding for the entity wire format.
//!
//! All fixed-width values are big-endian. Strings use the modified UTF-8
//! form of Java's `DataOutput.writeUTF`: a `u16` byte count followed by one
//! to three bytes per UTF-16 code unit, with NUL written as two bytes.
//! Byte arrays carry an `i32` length prefix.

use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_BYTES_LENGTH, MAX_UTF_LENGTH};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides bounds-checked reads. Every read takes a
/// static context string that ends up in the error on truncation.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::UnexpectedEof { context })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads a strict boolean (0x00 or 0x01).
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(context)? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            value => Err(DecodeError::InvalidBool { value, context }),
        }
    }

    pub fn read_i16(&mut self, context: &'static str) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.read_array(context)?))
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array(context)?))
    }

    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array(context)?))
    }

    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.read_array(context)?))
    }

    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.read_array(context)?))
    }

    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.read_array(context)?))
    }

    /// Reads a non-negative `i32` count and checks that `count * min_item_bytes`
    /// could still fit in the unread input.
    pub fn read_count(
        &mut self,
        min_item_bytes: usize,
        field: &'static str,
    ) -> Result<usize, DecodeError> {
        let raw = self.read_i32(field)?;
        let count = usize::try_from(raw).map_err(|_| DecodeError::NegativeLength {
            field,
            len: raw as i64,
        })?;
        let max = self.remaining_len() / min_item_bytes.max(1);
        if count > max {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len: count,
                max,
            });
        }
        Ok(count)
    }

    /// Reads a `u16` length-prefixed modified UTF-8 string.
    pub fn read_utf(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_u16(field)? as usize;
        let bytes = self.read_bytes(len, field)?;
        decode_modified_utf8(bytes, field)
    }

    /// Reads an `i32` length-prefixed byte array.
    pub fn read_bytes_prefixed(&mut self, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_i32(field)?;
        if len < 0 {
            return Err(DecodeError::NegativeLength {
                field,
                len: len as i64,
            });
        }
        Ok(self.read_bytes(len as usize, field)?.to_vec())
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written, which is also the offset of the
    /// next write.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes without a length prefix.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Overwrites four already-written bytes at `pos` with `value`.
    ///
    /// Used to back-fill a length prefix once the payload behind it is known.
    pub fn write_i32_at(&mut self, pos: usize, value: i32) -> Result<(), EncodeError> {
        let len = self.buf.len();
        let slot = pos
            .checked_add(4)
            .filter(|end| *end <= len)
            .map(|end| &mut self.buf[pos..end])
            .ok_or(EncodeError::InvalidPatchPosition { pos, len })?;
        slot.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Writes a count as `i32`.
    pub fn write_count(&mut self, count: usize, field: &'static str) -> Result<(), EncodeError> {
        let count = i32::try_from(count).map_err(|_| EncodeError::LengthExceedsLimit {
            field,
            len: count,
            max: i32::MAX as usize,
        })?;
        self.write_i32(count);
        Ok(())
    }

    /// Writes a `u16` length-prefixed modified UTF-8 string.
    pub fn write_utf(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        let len = utf_length(s);
        if len > MAX_UTF_LENGTH {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len,
                max: MAX_UTF_LENGTH,
            });
        }
        self.buf.reserve(2 + len);
        self.write_u16(len as u16);
        encode_modified_utf8(s, &mut self.buf);
        Ok(())
    }

    /// Writes an `i32` length-prefixed byte array.
    pub fn write_bytes_prefixed(
        &mut self,
        bytes: &[u8],
        field: &'static str,
    ) -> Result<(), EncodeError> {
        if bytes.len() > MAX_BYTES_LENGTH {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len: bytes.len(),
                max: MAX_BYTES_LENGTH,
            });
        }
        self.write_i32(bytes.len() as i32);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

// =============================================================================
// MODIFIED UTF-8
// =============================================================================

/// Returns the number of bytes `s` occupies in modified UTF-8, excluding the
/// length prefix.
///
/// Each UTF-16 code unit in `0x0001..=0x007F` takes one byte, units above
/// `0x07FF` take three, and everything else (including NUL) takes two.
pub fn utf_length(s: &str) -> usize {
    s.encode_utf16()
        .map(|c| match c {
            0x0001..=0x007F => 1,
            0x0800.. => 3,
            _ => 2,
        })
        .sum()
}

fn encode_modified_utf8(s: &str, out: &mut Vec<u8>) {
    for c in s.encode_utf16() {
        match c {
            0x0001..=0x007F => out.push(c as u8),
            0x0800.. => {
                out.push(0xE0 | ((c >> 12) & 0x0F) as u8);
                out.push(0x80 | ((c >> 6) & 0x3F) as u8);
                out.push(0x80 | (c & 0x3F) as u8);
            }
            _ => {
                out.push(0xC0 | ((c >> 6) & 0x1F) as u8);
                out.push(0x80 | (c & 0x3F) as u8);
            }
        }
    }
}

fn decode_modified_utf8(bytes: &[u8], field: &'static str) -> Result<String, DecodeError> {
    // Fast path: pure ASCII without NUL is identical in both encodings.
    if bytes.iter().all(|b| (0x01..=0x7F).contains(b)) {
        return std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::MalformedUtf { field });
    }

    let malformed = || DecodeError::MalformedUtf { field };
    let continuation = |b: Option<&u8>| match b {
        Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(malformed()),
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter();
    while let Some(&b) = iter.next() {
        let unit = match b >> 4 {
            0x0..=0x7 => b as u16,
            0xC | 0xD => ((b & 0x1F) as u16) << 6 | continuation(iter.next())?,
            0xE => {
                let hi = continuation(iter.next())?;
                let lo = continuation(iter.next())?;
                ((b & 0x0F) as u16) << 12 | hi << 6 | lo
            }
            _ => return Err(malformed()),
        };
        units.push(unit);
    }
    String::from_utf16(&units).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_width_big_endian() {
        let mut writer = Writer::new();
        writer.write_i16(0x0102);
        writer.write_i32(0x03040506);
        writer.write_i64(-2);
        assert_eq!(
            writer.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]
        );

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_i16("a").unwrap(), 0x0102);
        assert_eq!(reader.read_i32("b").unwrap(), 0x03040506);
        assert_eq!(reader.read_i64("c").unwrap(), -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_float_roundtrip() {
        let mut writer = Writer::new();
        writer.write_f32(-0.0);
        writer.write_f64(f64::MAX);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_f32("f").unwrap().to_bits(), (-0.0f32).to_bits());
        assert_eq!(reader.read_f64("d").unwrap(), f64::MAX);
    }

    #[test]
    fn test_strict_bool() {
        let mut reader = Reader::new(&[0, 1, 2]);
        assert!(!reader.read_bool("flag").unwrap());
        assert!(reader.read_bool("flag").unwrap());
        assert!(matches!(
            reader.read_bool("flag"),
            Err(DecodeError::InvalidBool { value: 2, .. })
        ));
    }

    #[test]
    fn test_utf_length() {
        assert_eq!(utf_length(""), 0);
        assert_eq!(utf_length("abc"), 3);
        assert_eq!(utf_length("\0"), 2);
        assert_eq!(utf_length("é"), 2);
        assert_eq!(utf_length("€"), 3);
        // Supplementary characters are two surrogates of three bytes each.
        assert_eq!(utf_length("\u{1F600}"), 6);
    }

    #[test]
    fn test_utf_wire_layout() {
        let mut writer = Writer::new();
        writer.write_utf("a\0é", "name").unwrap();
        assert_eq!(writer.as_bytes(), &[0, 5, b'a', 0xC0, 0x80, 0xC3, 0xA9]);
    }

    #[test]
    fn test_utf_roundtrip() {
        for s in ["", "hello", "nul\0inside", "unicode: \u{1F600} €"] {
            let mut writer = Writer::new();
            writer.write_utf(s, "test").unwrap();
            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_utf("test").unwrap(), s);
        }
    }

    #[test]
    fn test_utf_too_long() {
        let s = "x".repeat(MAX_UTF_LENGTH + 1);
        let mut writer = Writer::new();
        assert!(matches!(
            writer.write_utf(&s, "big"),
            Err(EncodeError::LengthExceedsLimit { field: "big", .. })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_malformed_utf_rejected() {
        // Length 2, lead byte of a 3-byte sequence with one continuation.
        let data = [0, 2, 0xE2, 0x82];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_utf("bad"),
            Err(DecodeError::MalformedUtf { field: "bad" })
        ));
    }

    #[test]
    fn test_bytes_prefixed() {
        let mut writer = Writer::new();
        writer.write_bytes_prefixed(&[9, 8, 7], "blob").unwrap();
        writer.write_bytes_prefixed(&[], "blob").unwrap();
        assert_eq!(writer.as_bytes(), &[0, 0, 0, 3, 9, 8, 7, 0, 0, 0, 0]);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_bytes_prefixed("blob").unwrap(), vec![9, 8, 7]);
        assert!(reader.read_bytes_prefixed("blob").unwrap().is_empty());
    }

    #[test]
    fn test_negative_byte_length() {
        let data = (-1i32).to_be_bytes();
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_bytes_prefixed("blob"),
            Err(DecodeError::NegativeLength { len: -1, .. })
        ));
    }

    #[test]
    fn test_count_bounded_by_input() {
        let mut writer = Writer::new();
        writer.write_i32(1_000_000);
        writer.write_bytes(&[0; 16]);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_count(8, "edges"),
            Err(DecodeError::LengthExceedsLimit { max: 2, .. })
        ));
    }

    #[test]
    fn test_patch_length() {
        let mut writer = Writer::new();
        let start = writer.len();
        writer.write_i32(0);
        writer.write_bytes(b"payload");
        let len = (writer.len() - start) as i32;
        writer.write_i32_at(start, len).unwrap();
        assert_eq!(&writer.as_bytes()[..4], &[0, 0, 0, 11]);

        assert!(matches!(
            writer.write_i32_at(9, 1),
            Err(EncodeError::InvalidPatchPosition { pos: 9, len: 11 })
        ));
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 3];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_i32("version"),
            Err(DecodeError::UnexpectedEof { context: "version" })
        ));
    }

    proptest! {
        #[test]
        fn prop_utf_roundtrip(s in "\\PC{0,64}") {
            let mut writer = Writer::new();
            writer.write_utf(&s, "prop").unwrap();
            prop_assert_eq!(writer.len(), 2 + utf_length(&s));
            let mut reader = Reader::new(writer.as_bytes());
            prop_assert_eq!(reader.read_utf("prop").unwrap(), s);
        }

        #[test]
        fn prop_i64_roundtrip(v in any::<i64>()) {
            let mut writer = Writer::new();
            writer.write_i64(v);
            let mut reader = Reader::new(writer.as_bytes());
            prop_assert_eq!(reader.read_i64("prop").unwrap(), v);
        }
    }
}
