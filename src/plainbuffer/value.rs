//! Scalar column values and their PlainBuffer encoding.
//!
//! An encoded value is one type byte followed by a type-specific payload:
//! 8-byte little-endian integers and doubles, a single boolean byte, 4-byte
//! little-endian length prefixed strings and blobs, and nothing for the
//! marker types.

use super::{
    error::{CodecError, CodecResult},
    reader::Reader,
};

/// Wire discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Signed 64-bit integer.
    Integer = 0x0,
    /// IEEE-754 double.
    Double = 0x1,
    /// Boolean.
    Boolean = 0x2,
    /// UTF-8 string.
    String = 0x3,
    /// Explicit null.
    Null = 0x6,
    /// Raw bytes.
    Blob = 0x7,
    /// Smallest possible key value.
    InfMin = 0x9,
    /// Largest possible key value.
    InfMax = 0xA,
    /// Placeholder for a server-assigned auto-increment key.
    AutoIncrement = 0xB,
}

impl ValueType {
    /// Return the on-wire type byte.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ValueType> for u8 {
    fn from(value: ValueType) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for ValueType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(ValueType::Integer),
            0x1 => Ok(ValueType::Double),
            0x2 => Ok(ValueType::Boolean),
            0x3 => Ok(ValueType::String),
            0x6 => Ok(ValueType::Null),
            0x7 => Ok(ValueType::Blob),
            0x9 => Ok(ValueType::InfMin),
            0xA => Ok(ValueType::InfMax),
            0xB => Ok(ValueType::AutoIncrement),
            _ => Err(()),
        }
    }
}

/// Scalar column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Integer(i64),
    /// IEEE-754 double.
    Double(f64),
    /// Boolean.
    Boolean(bool),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Explicit null.
    Null,
    /// Smallest possible key value, for open-ended range starts.
    InfMin,
    /// Largest possible key value, for open-ended range ends.
    InfMax,
    /// Placeholder for a server-assigned auto-increment key.
    AutoIncrement,
}

pub(crate) fn check_len(field: &'static str, len: usize) -> CodecResult<u32> {
    if len > i32::MAX as usize {
        return Err(CodecError::LengthOverflow { field, len });
    }
    Ok(len as u32)
}

impl Value {
    /// Classifies a number the way loosely typed callers expect: integral
    /// values that fit in `i64` become [`Value::Integer`], anything else
    /// (fractions, infinities, NaN, out of range) becomes [`Value::Double`].
    #[must_use]
    pub fn infer_number(number: f64) -> Self {
        // 2^63 is exactly representable, i64::MAX is not.
        const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;
        if number.is_finite() && number.fract() == 0.0 && number >= -I64_UPPER && number < I64_UPPER
        {
            Value::Integer(number as i64)
        } else {
            Value::Double(number)
        }
    }

    /// Wire discriminant of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::Boolean(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Blob(_) => ValueType::Blob,
            Value::Null => ValueType::Null,
            Value::InfMin => ValueType::InfMin,
            Value::InfMax => ValueType::InfMax,
            Value::AutoIncrement => ValueType::AutoIncrement,
        }
    }

    /// Number of bytes [`Value::encode_into`] appends.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Value::Integer(_) | Value::Double(_) => 8,
            Value::Boolean(_) => 1,
            Value::String(s) => 4 + s.len(),
            Value::Blob(b) => 4 + b.len(),
            Value::Null | Value::InfMin | Value::InfMax | Value::AutoIncrement => 0,
        }
    }

    /// Appends the type byte and payload to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> CodecResult<()> {
        buf.push(self.value_type().as_u8());
        match self {
            Value::Integer(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Boolean(v) => buf.push(u8::from(*v)),
            Value::String(s) => {
                buf.extend_from_slice(&check_len("string value", s.len())?.to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            Value::Blob(b) => {
                buf.extend_from_slice(&check_len("blob value", b.len())?.to_le_bytes());
                buf.extend_from_slice(b);
            }
            Value::Null | Value::InfMin | Value::InfMax | Value::AutoIncrement => {}
        }
        Ok(())
    }

    /// Encodes into a fresh buffer.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decodes the payload of a value whose type byte `tag` was already read.
    ///
    /// `offset` is where the payload starts in `bytes`; the returned offset is
    /// just past it, ready for the next sequential read.
    pub fn decode(tag: u8, bytes: &[u8], offset: usize) -> CodecResult<(Value, usize)> {
        let mut reader = Reader::at(bytes, offset);
        let value = Self::read_payload(tag, offset.saturating_sub(1), &mut reader)?;
        Ok((value, reader.position()))
    }

    /// Reads a type byte and its payload.
    pub(crate) fn read(reader: &mut Reader<'_>) -> CodecResult<Value> {
        let tag_offset = reader.position();
        let tag = reader.read_u8()?;
        Self::read_payload(tag, tag_offset, reader)
    }

    fn read_payload(tag: u8, tag_offset: usize, reader: &mut Reader<'_>) -> CodecResult<Value> {
        let value_type = ValueType::try_from(tag).map_err(|_| CodecError::UnknownValueType {
            tag,
            offset: tag_offset,
        })?;
        let value = match value_type {
            ValueType::Integer => Value::Integer(reader.read_i64_le()?),
            ValueType::Double => Value::Double(reader.read_f64_le()?),
            ValueType::Boolean => Value::Boolean(reader.read_u8()? != 0),
            ValueType::String => {
                let offset = reader.position();
                let bytes = reader.read_len_prefixed()?;
                let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { offset })?;
                Value::String(s.to_string())
            }
            ValueType::Blob => Value::Blob(reader.read_len_prefixed()?.to_vec()),
            ValueType::Null => Value::Null,
            ValueType::InfMin => Value::InfMin,
            ValueType::InfMax => Value::InfMax,
            ValueType::AutoIncrement => Value::AutoIncrement,
        };
        Ok(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

/// Goes through [`Value::infer_number`], so `3.0` becomes an integer.
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::infer_number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_round_trip() {
        for ty in [
            ValueType::Integer,
            ValueType::Double,
            ValueType::Boolean,
            ValueType::String,
            ValueType::Null,
            ValueType::Blob,
            ValueType::InfMin,
            ValueType::InfMax,
            ValueType::AutoIncrement,
        ] {
            assert_eq!(ValueType::try_from(u8::from(ty)).unwrap(), ty);
        }
        assert!(ValueType::try_from(0x4).is_err());
    }

    #[test]
    fn encodes_wire_layout() {
        assert_eq!(
            Value::Integer(-2).encode().unwrap(),
            [0x00, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            Value::from("v").encode().unwrap(),
            [0x03, 0x01, 0x00, 0x00, 0x00, b'v']
        );
        assert_eq!(Value::Boolean(true).encode().unwrap(), [0x02, 0x01]);
        assert_eq!(Value::from(vec![9u8, 8]).encode().unwrap(), [0x07, 2, 0, 0, 0, 9, 8]);
        assert_eq!(Value::InfMin.encode().unwrap(), [0x09]);
        assert_eq!(Value::InfMax.encode().unwrap(), [0x0A]);
        assert_eq!(Value::AutoIncrement.encode().unwrap(), [0x0B]);

        let mut expected = vec![0x01];
        expected.extend_from_slice(&1.5f64.to_le_bytes());
        assert_eq!(Value::Double(1.5).encode().unwrap(), expected);
    }

    #[test]
    fn encoded_len_matches_encoding() {
        for value in [
            Value::Integer(7),
            Value::Double(0.25),
            Value::Boolean(false),
            Value::from("hello"),
            Value::from(&b"\x00\x01"[..]),
            Value::Null,
            Value::InfMax,
        ] {
            assert_eq!(value.encode().unwrap().len(), value.encoded_len());
        }
    }

    #[test]
    fn number_inference() {
        assert_eq!(Value::from(3.0), Value::Integer(3));
        assert_eq!(Value::from(-0.0), Value::Integer(0));
        assert_eq!(Value::from(1.1), Value::Double(1.1));
        assert_eq!(Value::infer_number(1e300), Value::Double(1e300));
        assert!(matches!(Value::infer_number(f64::NAN), Value::Double(v) if v.is_nan()));
        assert_eq!(
            Value::infer_number(f64::INFINITY),
            Value::Double(f64::INFINITY)
        );
    }

    #[test]
    fn decode_returns_advanced_offset() {
        let mut bytes = vec![0xAA];
        Value::from("abc").encode_into(&mut bytes).unwrap();
        Value::Integer(42).encode_into(&mut bytes).unwrap();

        let (first, next) = Value::decode(bytes[1], &bytes, 2).unwrap();
        assert_eq!(first, Value::from("abc"));
        assert_eq!(next, 9);
        let (second, end) = Value::decode(bytes[next], &bytes, next + 1).unwrap();
        assert_eq!(second, Value::Integer(42));
        assert_eq!(end, bytes.len());
    }

    #[test]
    fn decode_rejects_unknown_type_and_short_payload() {
        let err = Value::decode(0x05, &[0x05], 1).unwrap_err();
        assert_eq!(err, CodecError::UnknownValueType { tag: 0x05, offset: 0 });

        let err = Value::decode(0x03, &[0x03, 0x10, 0, 0, 0, b'x'], 1).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedBuffer { needed: 16, .. }));

        let err = Value::decode(0x00, &[0x00, 1, 2, 3], 1).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedBuffer { offset: 1, .. }));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let bytes = [0x03, 0x02, 0, 0, 0, 0xC3, 0x28];
        let err = Value::decode(0x03, &bytes, 1).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { offset: 1 });
    }
}
