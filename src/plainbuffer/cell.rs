//! Cell encoding: one named value plus optional mutation metadata.
//!
//! ```text
//! cell = CELL cell_name [cell_value] [cell_op] [cell_ts] cell_checksum
//! ```
//!
//! The checksum folds name, value, timestamp and then op, which is not the
//! order the fields appear on the wire.

use super::{
    error::{CodecError, CodecResult},
    reader::Reader,
    tag,
    value::{check_len, Value},
};
use crate::{checksum, logging::codec_log};

/// Mutation applied to a single attribute cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellOp {
    /// Drop every version of the column.
    DeleteAllVersions = 0x1,
    /// Drop the version at the cell's timestamp.
    DeleteOneVersion = 0x3,
}

impl CellOp {
    /// Return the on-wire op byte.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CellOp {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x1 => Ok(CellOp::DeleteAllVersions),
            0x3 => Ok(CellOp::DeleteOneVersion),
            _ => Err(()),
        }
    }
}

/// Named column value with optional op and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Column name.
    pub name: String,
    /// Column value; absent for deletes.
    pub value: Option<Value>,
    /// Mutation op, if any.
    pub op: Option<CellOp>,
    /// Version timestamp in milliseconds.
    pub timestamp: Option<i64>,
}

impl Cell {
    /// Plain `name = value` cell.
    pub fn put(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            op: None,
            timestamp: None,
        }
    }

    /// Deletes the version of `name` written at `timestamp`.
    pub fn delete_one_version(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            value: None,
            op: Some(CellOp::DeleteOneVersion),
            timestamp: Some(timestamp),
        }
    }

    /// Deletes every version of `name`.
    pub fn delete_all_versions(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            op: Some(CellOp::DeleteAllVersions),
            timestamp: None,
        }
    }

    /// Primary-key cell holding the minimum sentinel.
    pub fn inf_min(name: impl Into<String>) -> Self {
        Self::put(name, Value::InfMin)
    }

    /// Primary-key cell holding the maximum sentinel.
    pub fn inf_max(name: impl Into<String>) -> Self {
        Self::put(name, Value::InfMax)
    }

    /// Primary-key cell whose value the service assigns.
    pub fn auto_increment(name: impl Into<String>) -> Self {
        Self::put(name, Value::AutoIncrement)
    }

    /// Attaches a version timestamp.
    #[must_use]
    pub fn with_timestamp(self, timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// Checksum of this cell, as written in its `CELL_CHECKSUM` field.
    pub fn checksum(&self) -> CodecResult<u8> {
        let value = self.value.as_ref().map(Value::encode).transpose()?;
        Ok(fold_checksum(
            self.name.as_bytes(),
            value.as_deref(),
            self.timestamp,
            self.op,
        ))
    }

    /// Appends the encoded cell to `buf` and returns its checksum.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> CodecResult<u8> {
        buf.push(tag::CELL);

        buf.push(tag::CELL_NAME);
        buf.extend_from_slice(&check_len("cell name", self.name.len())?.to_le_bytes());
        buf.extend_from_slice(self.name.as_bytes());

        let mut encoded_value = None;
        if let Some(value) = &self.value {
            let bytes = value.encode()?;
            buf.push(tag::CELL_VALUE);
            buf.extend_from_slice(&check_len("cell value", bytes.len())?.to_le_bytes());
            buf.extend_from_slice(&bytes);
            encoded_value = Some(bytes);
        }

        if let Some(op) = self.op {
            buf.push(tag::CELL_OP);
            buf.push(op.as_u8());
        }

        if let Some(ts) = self.timestamp {
            buf.push(tag::CELL_TS);
            buf.extend_from_slice(&ts.to_le_bytes());
        }

        let checksum = fold_checksum(
            self.name.as_bytes(),
            encoded_value.as_deref(),
            self.timestamp,
            self.op,
        );
        buf.push(tag::CELL_CHECKSUM);
        buf.push(checksum);

        Ok(checksum)
    }
}

fn fold_checksum(
    name: &[u8],
    value: Option<&[u8]>,
    timestamp: Option<i64>,
    op: Option<CellOp>,
) -> u8 {
    let mut crc = checksum::fold_bytes(0, name);
    if let Some(value) = value {
        crc = checksum::fold_bytes(crc, value);
    }
    if let Some(ts) = timestamp {
        crc = checksum::fold_bytes(crc, &ts.to_le_bytes());
    }
    if let Some(op) = op {
        crc = checksum::fold_byte(crc, op.as_u8());
    }
    crc
}

/// Cell as read back from the wire, with its stored checksum.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCell {
    /// Decoded content.
    pub cell: Cell,
    /// Checksum byte stored on the wire, if the cell carried one.
    pub checksum: Option<u8>,
    /// Checksum recomputed from the decoded content.
    pub computed_checksum: u8,
}

impl DecodedCell {
    /// Checksum used when folding the enclosing group: the stored byte when
    /// present, otherwise the recomputed one.
    #[must_use]
    pub fn effective_checksum(&self) -> u8 {
        self.checksum.unwrap_or(self.computed_checksum)
    }

    /// Reads one cell after its `CELL` tag.
    ///
    /// Optional fields are matched in wire order; decoding stops at the first
    /// tag that does not match, leaving it for the enclosing group.
    pub(crate) fn read(reader: &mut Reader<'_>, verify_checksum: bool) -> CodecResult<Self> {
        let name_offset = reader.position();
        if !reader.eat_tag(tag::CELL_NAME)? {
            return Err(CodecError::MissingName {
                offset: name_offset,
            });
        }
        let name_bytes = reader.read_len_prefixed()?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| CodecError::InvalidUtf8 {
                offset: name_offset + 1,
            })?
            .to_string();

        let mut value = None;
        let mut value_bytes = None;
        if reader.eat_tag(tag::CELL_VALUE)? {
            let len = reader.read_u32_le()? as usize;
            let mut field = reader.sub(len)?;
            value_bytes = Some(field.rest());
            value = Some(Value::read(&mut field)?);
            // The declared field length must be exactly the value's encoding.
            if !field.is_empty() {
                return Err(CodecError::UnexpectedTag {
                    tag: field.peek_tag()?,
                    offset: field.position(),
                });
            }
        }

        let mut op = None;
        if reader.eat_tag(tag::CELL_OP)? {
            let offset = reader.position();
            let raw = reader.read_u8()?;
            let parsed =
                CellOp::try_from(raw).map_err(|_| CodecError::UnknownCellOp { op: raw, offset })?;
            op = Some(parsed);
        }

        let mut timestamp = None;
        if reader.eat_tag(tag::CELL_TS)? {
            timestamp = Some(reader.read_i64_le()?);
        }

        let mut stored = None;
        if reader.eat_tag(tag::CELL_CHECKSUM)? {
            stored = Some((reader.position(), reader.read_u8()?));
        }

        let computed_checksum = fold_checksum(name_bytes, value_bytes, timestamp, op);
        let cell = Cell {
            name,
            value,
            op,
            timestamp,
        };
        if verify_checksum {
            if let Some((offset, stored)) = stored {
                if stored != computed_checksum {
                    codec_log!(
                        log::Level::Warn,
                        "checksum_mismatch",
                        "scope=cell name={} stored={:#04x} computed={:#04x} offset={}",
                        cell.name,
                        stored,
                        computed_checksum,
                        offset
                    );
                    return Err(CodecError::ChecksumMismatch {
                        scope: "cell",
                        stored,
                        computed: computed_checksum,
                        offset,
                    });
                }
            }
        }

        Ok(Self {
            cell,
            checksum: stored.map(|(_, checksum)| checksum),
            computed_checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(cell: &Cell) -> (Vec<u8>, u8) {
        let mut buf = Vec::new();
        let crc = cell.encode_into(&mut buf).unwrap();
        (buf, crc)
    }

    fn decode(bytes: &[u8]) -> CodecResult<DecodedCell> {
        let mut reader = Reader::new(bytes);
        assert!(reader.eat_tag(tag::CELL)?);
        DecodedCell::read(&mut reader, true)
    }

    #[test]
    fn put_cell_wire_layout() {
        let (bytes, crc) = encode(&Cell::put("a", true));
        let expected_crc = checksum::fold_bytes(checksum::fold_bytes(0, b"a"), &[0x02, 0x01]);
        assert_eq!(crc, expected_crc);
        assert_eq!(
            bytes,
            [
                tag::CELL,
                tag::CELL_NAME,
                1,
                0,
                0,
                0,
                b'a',
                tag::CELL_VALUE,
                2,
                0,
                0,
                0,
                0x02,
                0x01,
                tag::CELL_CHECKSUM,
                expected_crc,
            ]
        );
    }

    #[test]
    fn op_is_folded_after_timestamp() {
        let cell = Cell::delete_one_version("col", 1_500);
        let (bytes, crc) = encode(&cell);

        let mut expected = checksum::fold_bytes(0, b"col");
        expected = checksum::fold_bytes(expected, &1_500i64.to_le_bytes());
        expected = checksum::fold_byte(expected, CellOp::DeleteOneVersion.as_u8());
        assert_eq!(crc, expected);

        // Wire order is op before timestamp.
        let op_at = bytes.iter().position(|b| *b == tag::CELL_OP).unwrap();
        assert_eq!(bytes[op_at + 1], 0x03);
        assert_eq!(bytes[op_at + 2], tag::CELL_TS);
    }

    #[test]
    fn checksum_tracks_every_field() {
        let base = Cell::put("n", 1i64).with_timestamp(10);
        let crc = base.checksum().unwrap();
        assert_eq!(crc, base.checksum().unwrap());
        assert_ne!(crc, Cell::put("m", 1i64).with_timestamp(10).checksum().unwrap());
        assert_ne!(crc, Cell::put("n", 2i64).with_timestamp(10).checksum().unwrap());
        assert_ne!(crc, Cell::put("n", 1i64).with_timestamp(11).checksum().unwrap());

        let mut with_op = base.clone();
        with_op.op = Some(CellOp::DeleteAllVersions);
        assert_ne!(crc, with_op.checksum().unwrap());
    }

    #[test]
    fn decodes_op_byte_before_timestamp() {
        // A reader that skipped the op payload would take 0x03 as the next tag
        // and never see the timestamp.
        let cell = Cell::delete_one_version("col", 42);
        let (bytes, crc) = encode(&cell);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.cell, cell);
        assert_eq!(decoded.checksum, Some(crc));
        assert_eq!(decoded.computed_checksum, crc);
    }

    #[test]
    fn delete_all_versions_round_trips() {
        let cell = Cell::delete_all_versions("col");
        let (bytes, _) = encode(&cell);
        assert_eq!(decode(&bytes).unwrap().cell, cell);
    }

    #[test]
    fn sentinels_round_trip() {
        for cell in [Cell::inf_min("k"), Cell::inf_max("k"), Cell::auto_increment("k")] {
            let (bytes, _) = encode(&cell);
            assert_eq!(decode(&bytes).unwrap().cell, cell);
        }
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = decode(&[tag::CELL, tag::CELL_VALUE, 1, 0, 0, 0, 0x09]).unwrap_err();
        assert_eq!(err, CodecError::MissingName { offset: 1 });
    }

    #[test]
    fn unknown_op_is_rejected() {
        let bytes = [tag::CELL, tag::CELL_NAME, 1, 0, 0, 0, b'x', tag::CELL_OP, 0x02];
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, CodecError::UnknownCellOp { op: 0x02, offset: 8 });
    }

    #[test]
    fn value_cannot_overrun_its_field() {
        // Declared field length 3 but the string payload claims 4 bytes.
        let bytes = [
            tag::CELL,
            tag::CELL_NAME,
            1,
            0,
            0,
            0,
            b'x',
            tag::CELL_VALUE,
            3,
            0,
            0,
            0,
            0x03,
            4,
            0,
            0,
            0,
            b'a',
            b'b',
            b'c',
            b'd',
        ];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedBuffer { offset: 13, .. }));
    }

    #[test]
    fn value_must_fill_its_field() {
        // Declared field length 3 but the boolean encoding is only 2 bytes.
        let bytes = [
            tag::CELL,
            tag::CELL_NAME,
            1,
            0,
            0,
            0,
            b'x',
            tag::CELL_VALUE,
            3,
            0,
            0,
            0,
            0x02,
            0x01,
            tag::CELL_TS,
        ];
        let expected = CodecError::UnexpectedTag {
            tag: tag::CELL_TS,
            offset: 14,
        };
        assert_eq!(decode(&bytes).unwrap_err(), expected);

        let mut reader = Reader::new(&bytes);
        reader.eat_tag(tag::CELL).unwrap();
        assert_eq!(DecodedCell::read(&mut reader, false).unwrap_err(), expected);
    }

    #[test]
    fn corrupted_cell_checksum_is_detected() {
        let (mut bytes, crc) = encode(&Cell::put("x", "y"));
        let last = bytes.len() - 1;
        bytes[last] = crc.wrapping_add(1);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            CodecError::ChecksumMismatch {
                scope: "cell",
                stored: crc.wrapping_add(1),
                computed: crc,
                offset: last,
            }
        );
    }
}
