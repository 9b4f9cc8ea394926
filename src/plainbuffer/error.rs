use thiserror::Error;

/// Result alias for PlainBuffer encode/decode.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised by the PlainBuffer codecs.
///
/// Decode errors carry the absolute byte offset into the input buffer at
/// which the problem was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value type byte outside the known set.
    #[error("unknown value type 0x{tag:02x} at offset {offset}")]
    UnknownValueType {
        /// Offending type byte.
        tag: u8,
        /// Offset of the type byte.
        offset: usize,
    },
    /// Cell without its mandatory name.
    #[error("cell at offset {offset} has no name")]
    MissingName {
        /// Offset where the name tag was expected.
        offset: usize,
    },
    /// Input ended, or a declared length ran past the enclosing field.
    #[error("buffer truncated at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedBuffer {
        /// Offset of the short read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the enclosing field.
        remaining: usize,
    },
    /// Leading four bytes are not the PlainBuffer header.
    #[error("no plainbuffer header: found 0x{found:08x}")]
    NoHeader {
        /// Little-endian word found in place of the header.
        found: u32,
    },
    /// Row with neither primary-key nor attribute cells.
    #[error("row must have primary key or attribute columns")]
    MissingPrimaryKeyOrAttributes,
    /// Tag that cannot start or continue a row.
    #[error("unexpected tag 0x{tag:02x} at offset {offset}")]
    UnexpectedTag {
        /// Offending tag byte.
        tag: u8,
        /// Offset of the tag byte.
        offset: usize,
    },
    /// Cell op byte outside the known set.
    #[error("unknown cell op 0x{op:02x} at offset {offset}")]
    UnknownCellOp {
        /// Offending op byte.
        op: u8,
        /// Offset of the op byte.
        offset: usize,
    },
    /// Stored checksum disagrees with the recomputed one.
    #[error("{scope} checksum mismatch at offset {offset}: stored 0x{stored:02x}, computed 0x{computed:02x}")]
    ChecksumMismatch {
        /// `"cell"` or `"row"`.
        scope: &'static str,
        /// Checksum byte read from the buffer.
        stored: u8,
        /// Checksum recomputed from the decoded content.
        computed: u8,
        /// Offset of the stored checksum byte.
        offset: usize,
    },
    /// Cell name or string value is not valid UTF-8.
    #[error("invalid utf-8 at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string payload.
        offset: usize,
    },
    /// Field too long for its 4-byte length prefix.
    #[error("{field} length {len} exceeds i32::MAX")]
    LengthOverflow {
        /// Field being encoded.
        field: &'static str,
        /// Actual length.
        len: usize,
    },
    /// Input the value inference policy does not accept.
    #[error("unsupported input: {0}")]
    UnsupportedInput(&'static str),
    /// Buffer holds more rows than the configured limit.
    #[error("plainbuffer holds more than {limit} rows")]
    TooManyRows {
        /// Configured row limit.
        limit: usize,
    },
}
