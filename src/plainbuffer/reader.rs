//! Bounds-checked cursor over untrusted PlainBuffer input.

use super::error::{CodecError, CodecResult};

/// Cursor over `buf[pos..end]`. Offsets reported in errors are absolute
/// positions in the outermost buffer, including for nested readers.
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            end: buf.len(),
        }
    }

    /// Starts reading `buf` at `offset`; an offset past the end yields an empty reader.
    pub(crate) fn at(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            pos: offset.min(buf.len()),
            end: buf.len(),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    /// Unread bytes, without consuming them.
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..self.end]
    }

    fn truncated(&self, needed: usize) -> CodecError {
        CodecError::TruncatedBuffer {
            offset: self.pos,
            needed,
            remaining: self.remaining(),
        }
    }

    /// Next byte without consuming it. Running out of input mid-structure is
    /// an error, so callers only peek where more bytes are mandatory.
    pub(crate) fn peek_tag(&self) -> CodecResult<u8> {
        if self.is_empty() {
            return Err(self.truncated(1));
        }
        Ok(self.buf[self.pos])
    }

    /// Consumes `tag` if it is the next byte.
    pub(crate) fn eat_tag(&mut self, tag: u8) -> CodecResult<bool> {
        if self.peek_tag()? == tag {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn read_u32_le(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_i64_le(&mut self) -> CodecResult<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_f64_le(&mut self) -> CodecResult<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Reads a 4-byte length prefix followed by that many bytes.
    pub(crate) fn read_len_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let len = self.read_u32_le()? as usize;
        self.take(len)
    }

    /// Splits off the next `len` bytes as a nested reader and skips past them.
    pub(crate) fn sub(&mut self, len: usize) -> CodecResult<Reader<'a>> {
        let start = self.pos;
        self.take(len)?;
        Ok(Reader {
            buf: self.buf,
            pos: start,
            end: start + len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let bytes = [0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c', 0x7F];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_len_prefixed().unwrap(), b"abc");
        assert_eq!(reader.read_u8().unwrap(), 0x7F);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_reads_are_typed_errors() {
        let bytes = [0xFF, 0xFF, 0x00, 0x00, 0x01];
        let mut reader = Reader::new(&bytes);
        let err = reader.read_len_prefixed().unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedBuffer {
                offset: 4,
                needed: 0xFFFF,
                remaining: 1
            }
        );
        assert!(Reader::new(&[]).peek_tag().is_err());
    }

    #[test]
    fn nested_reader_is_bounded() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut outer = Reader::new(&bytes);
        outer.read_u8().unwrap();
        let mut inner = outer.sub(2).unwrap();
        assert_eq!(outer.position(), 3);
        assert_eq!(inner.read_u8().unwrap(), 2);
        assert_eq!(inner.read_u8().unwrap(), 3);
        let err = inner.read_u8().unwrap_err();
        assert!(matches!(err, CodecError::TruncatedBuffer { offset: 3, .. }));
        assert_eq!(outer.read_u8().unwrap(), 4);
    }
}
