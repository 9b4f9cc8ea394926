//! Cell groups and rows.
//!
//! ```text
//! row = ( pk [attr] | [pk] attr | pk attr ) [DELETE_MARKER] row_checksum
//! pk  = PK cell+
//! attr = ATTR cell+
//! ```

use std::collections::BTreeMap;

use super::{
    cell::{Cell, DecodedCell},
    error::{CodecError, CodecResult},
    reader::Reader,
    tag,
    value::Value,
};
use crate::{checksum, logging::codec_log};

/// Row flattened to `column name -> value`.
pub type FlatRow = BTreeMap<String, Value>;

/// Which half of a row a cell group holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GroupKind {
    /// Primary-key columns.
    PrimaryKey = tag::PK,
    /// Attribute columns.
    Attribute = tag::ATTR,
}

/// Ordered cells under a primary-key or attribute tag.
#[derive(Debug, Clone, Copy)]
pub struct CellGroup<'a> {
    kind: GroupKind,
    cells: &'a [Cell],
}

impl<'a> CellGroup<'a> {
    /// Groups `cells` under `kind`.
    #[must_use]
    pub fn new(kind: GroupKind, cells: &'a [Cell]) -> Self {
        Self { kind, cells }
    }

    /// Appends the group to `buf` and returns `seed` folded with every
    /// member cell's checksum. An empty group writes nothing.
    pub fn encode_into(&self, buf: &mut Vec<u8>, seed: u8) -> CodecResult<u8> {
        if self.cells.is_empty() {
            return Ok(seed);
        }
        buf.push(self.kind as u8);
        let mut crc = seed;
        for cell in self.cells {
            crc = checksum::fold_byte(crc, cell.encode_into(buf)?);
        }
        Ok(crc)
    }
}

/// Row to be written: primary key, attributes and an optional delete marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Primary-key cells, in schema order.
    pub primary_key: Vec<Cell>,
    /// Attribute cells.
    pub attributes: Vec<Cell>,
    /// Marks the whole row as deleted.
    pub delete_marker: bool,
}

impl Row {
    /// Empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends primary-key cells.
    #[must_use]
    pub fn with_primary_key<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        self.primary_key.extend(cells);
        self
    }

    /// Appends attribute cells.
    #[must_use]
    pub fn with_attributes<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        self.attributes.extend(cells);
        self
    }

    /// Appends one put cell per `name -> value` entry to the primary key.
    #[must_use]
    pub fn with_primary_key_values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with_primary_key(values.into_iter().map(|(name, value)| Cell::put(name, value)))
    }

    /// Appends one put cell per `name -> value` entry to the attributes.
    #[must_use]
    pub fn with_attribute_values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with_attributes(values.into_iter().map(|(name, value)| Cell::put(name, value)))
    }

    /// Sets the delete marker.
    #[must_use]
    pub fn with_delete_marker(self) -> Self {
        Self {
            delete_marker: true,
            ..self
        }
    }

    /// Encodes a single row as a complete PlainBuffer.
    pub fn serialize(
        primary_key: Vec<Cell>,
        attributes: Vec<Cell>,
        delete_marker: bool,
    ) -> CodecResult<Vec<u8>> {
        let row = Row {
            primary_key,
            attributes,
            delete_marker,
        };
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&tag::HEADER.to_le_bytes());
        row.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Appends the row to `buf` and returns its row checksum.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> CodecResult<u8> {
        if self.primary_key.is_empty() && self.attributes.is_empty() {
            return Err(CodecError::MissingPrimaryKeyOrAttributes);
        }

        let mut crc = CellGroup::new(GroupKind::PrimaryKey, &self.primary_key).encode_into(buf, 0)?;
        crc = CellGroup::new(GroupKind::Attribute, &self.attributes).encode_into(buf, crc)?;

        if self.delete_marker {
            buf.push(tag::DELETE_MARKER);
        }
        // The marker's presence is folded even when the tag is not written.
        crc = checksum::fold_byte(crc, u8::from(self.delete_marker));

        buf.push(tag::ROW_CHECKSUM);
        buf.push(crc);
        Ok(crc)
    }
}

/// Row as read back from the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    /// Primary-key cells in wire order.
    pub primary_key: Vec<DecodedCell>,
    /// Attribute cells in wire order.
    pub attributes: Vec<DecodedCell>,
    /// Whether a delete marker was present.
    pub delete_marker: bool,
    /// Row checksum stored on the wire, if present.
    pub checksum: Option<u8>,
}

impl DecodedRow {
    /// Flattens the row into one map. Attributes are applied after primary
    /// keys, so an attribute wins a name collision. Cells without a value
    /// (deletes) are skipped.
    #[must_use]
    pub fn flatten(&self) -> FlatRow {
        self.primary_key
            .iter()
            .chain(self.attributes.iter())
            .filter_map(|decoded| {
                let cell = &decoded.cell;
                cell.value.clone().map(|value| (cell.name.clone(), value))
            })
            .collect()
    }

    /// Drops wire metadata, yielding a row that can be re-encoded.
    #[must_use]
    pub fn into_row(self) -> Row {
        Row {
            primary_key: self.primary_key.into_iter().map(|c| c.cell).collect(),
            attributes: self.attributes.into_iter().map(|c| c.cell).collect(),
            delete_marker: self.delete_marker,
        }
    }

    fn computed_checksum(&self) -> u8 {
        let crc = self
            .primary_key
            .iter()
            .chain(self.attributes.iter())
            .fold(0, |crc, cell| {
                checksum::fold_byte(crc, cell.effective_checksum())
            });
        checksum::fold_byte(crc, u8::from(self.delete_marker))
    }

    pub(crate) fn read(reader: &mut Reader<'_>, verify_checksum: bool) -> CodecResult<Self> {
        let start = reader.position();
        let mut row = DecodedRow::default();

        if reader.eat_tag(tag::PK)? {
            row.primary_key = read_cells(reader, verify_checksum)?;
        }
        if reader.eat_tag(tag::ATTR)? {
            row.attributes = read_cells(reader, verify_checksum)?;
        }
        if reader.eat_tag(tag::DELETE_MARKER)? {
            row.delete_marker = true;
        }
        let mut stored = None;
        if reader.eat_tag(tag::ROW_CHECKSUM)? {
            stored = Some((reader.position(), reader.read_u8()?));
        }

        if reader.position() == start {
            return Err(CodecError::UnexpectedTag {
                tag: reader.peek_tag()?,
                offset: start,
            });
        }

        if verify_checksum {
            if let Some((offset, stored)) = stored {
                let computed = row.computed_checksum();
                if stored != computed {
                    codec_log!(
                        log::Level::Warn,
                        "checksum_mismatch",
                        "scope=row stored={:#04x} computed={:#04x} offset={}",
                        stored,
                        computed,
                        offset
                    );
                    return Err(CodecError::ChecksumMismatch {
                        scope: "row",
                        stored,
                        computed,
                        offset,
                    });
                }
            }
        }
        row.checksum = stored.map(|(_, checksum)| checksum);

        Ok(row)
    }
}

fn read_cells(reader: &mut Reader<'_>, verify_checksum: bool) -> CodecResult<Vec<DecodedCell>> {
    let mut cells = Vec::new();
    while reader.eat_tag(tag::CELL)? {
        cells.push(DecodedCell::read(reader, verify_checksum)?);
    }
    Ok(cells)
}
