//! PlainBuffer: the tag-delimited binary row format of the TableStore data plane.
//!
//! ```text
//! plainbuffer = HEADER row+
//! ```
//!
//! Every multi-byte integer is little-endian and every variable-length field
//! carries a 4-byte length prefix. Decoding treats input as untrusted: all
//! lengths are checked against the enclosing field before use, and running
//! out of input inside a row is reported as
//! [`CodecError::TruncatedBuffer`].

mod cell;
mod error;
pub(crate) mod reader;
mod row;
mod value;

pub use cell::{Cell, CellOp, DecodedCell};
pub use error::{CodecError, CodecResult};
pub use row::{CellGroup, DecodedRow, FlatRow, GroupKind, Row};
pub use value::{Value, ValueType};

use crate::{logging::codec_log, option::DecodeOption};
use reader::Reader;

/// Structural tag bytes.
pub mod tag {
    /// Leading 4-byte little-endian word of every PlainBuffer.
    pub const HEADER: u32 = 0x75;
    /// Start of the primary-key group.
    pub const PK: u8 = 0x01;
    /// Start of the attribute group.
    pub const ATTR: u8 = 0x02;
    /// Start of a cell.
    pub const CELL: u8 = 0x03;
    /// Cell name field.
    pub const CELL_NAME: u8 = 0x04;
    /// Cell value field.
    pub const CELL_VALUE: u8 = 0x05;
    /// Cell mutation op field.
    pub const CELL_OP: u8 = 0x06;
    /// Cell timestamp field.
    pub const CELL_TS: u8 = 0x07;
    /// Row delete marker.
    pub const DELETE_MARKER: u8 = 0x08;
    /// Row checksum field.
    pub const ROW_CHECKSUM: u8 = 0x09;
    /// Cell checksum field.
    pub const CELL_CHECKSUM: u8 = 0x0A;
}

/// Size of the leading header word.
pub const HEADER_SIZE: usize = 4;

/// Ordered rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainBuffer {
    rows: Vec<Row>,
}

impl PlainBuffer {
    /// Wraps `rows` for encoding.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Rows in encode order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Encodes the header followed by every row.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + 64 * self.rows.len());
        buf.extend_from_slice(&tag::HEADER.to_le_bytes());
        for row in &self.rows {
            row.encode_into(&mut buf)?;
        }
        Ok(buf)
    }

    /// Encodes each row as its own single-row PlainBuffer, the shape batch
    /// writes expect.
    pub fn encode_each(rows: &[Row]) -> CodecResult<Vec<Vec<u8>>> {
        rows.iter()
            .map(|row| {
                let mut buf = Vec::with_capacity(HEADER_SIZE + 64);
                buf.extend_from_slice(&tag::HEADER.to_le_bytes());
                row.encode_into(&mut buf)?;
                Ok(buf)
            })
            .collect()
    }

    /// Decodes `bytes` with default options into flattened rows.
    pub fn decode(bytes: &[u8]) -> CodecResult<Vec<FlatRow>> {
        Self::decode_with(bytes, &DecodeOption::default())
    }

    /// Decodes `bytes` into flattened rows.
    pub fn decode_with(bytes: &[u8], option: &DecodeOption) -> CodecResult<Vec<FlatRow>> {
        Ok(Self::decode_rows(bytes, option)?
            .iter()
            .map(DecodedRow::flatten)
            .collect())
    }

    /// Decodes a buffer holding at most one row, as point reads return;
    /// `None` when it holds none.
    pub fn decode_first(bytes: &[u8], option: &DecodeOption) -> CodecResult<Option<FlatRow>> {
        let option = option.clone().max_rows(1);
        Ok(Self::decode_rows(bytes, &option)?
            .first()
            .map(DecodedRow::flatten))
    }

    /// Decodes `bytes` keeping per-cell ops, timestamps and checksums.
    ///
    /// Empty input yields no rows. Otherwise the header is validated and one
    /// or more rows are read until the input is exhausted; a header with no
    /// row behind it is [`CodecError::TruncatedBuffer`].
    pub fn decode_rows(bytes: &[u8], option: &DecodeOption) -> CodecResult<Vec<DecodedRow>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::new(bytes);
        let header = reader.read_u32_le()?;
        if header != tag::HEADER {
            return Err(CodecError::NoHeader { found: header });
        }

        // At least one row follows the header; a bare header is a cut-off buffer.
        let mut rows = Vec::new();
        loop {
            if let Some(limit) = option.max_rows {
                if rows.len() == limit {
                    return Err(CodecError::TooManyRows { limit });
                }
            }
            rows.push(DecodedRow::read(&mut reader, option.verify_checksum)?);
            if reader.is_empty() {
                break;
            }
        }

        codec_log!(
            log::Level::Debug,
            "plainbuffer_decoded",
            "rows={} bytes={}",
            rows.len(),
            bytes.len()
        );
        Ok(rows)
    }
}

impl From<Vec<Row>> for PlainBuffer {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}
