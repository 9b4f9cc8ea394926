#![deny(missing_docs)]
//! Data-plane codecs for a TableStore client.
//!
//! Two independent pieces live here. The [`plainbuffer`] module encodes rows
//! into, and decodes them out of, the service's tag-delimited PlainBuffer
//! format with its CRC8 cell and row checksums. The [`filter`] module
//! compiles predicate text such as `age >= @min true AND NOT name == @who false`
//! into the nested filter records a read request carries. Both are pure and
//! synchronous; transport and request signing belong to the caller.
//!
//! ```ignore
//! use tablestore_codec::{Bindings, Cell, PlainBuffer, Row};
//!
//! let row = Row::new()
//!     .with_primary_key([Cell::put("uid", "u1")])
//!     .with_attributes([Cell::put("count", 3i64)]);
//! let bytes = PlainBuffer::new(vec![row]).encode()?;
//! let rows = PlainBuffer::decode(&bytes)?;
//!
//! let filter = tablestore_codec::make_filter(
//!     "count > @min true",
//!     &Bindings::new().bind("min", 1i64),
//! )?;
//! ```

mod error;
mod logging;

pub mod checksum;
pub mod filter;

/// Decode-time options.
pub mod option;

pub mod plainbuffer;

pub use error::{Error, Result};
pub use filter::{compile, make_filter, resolve, Bindings, CompiledFilter, ResolvedFilter};
pub use option::DecodeOption;
pub use plainbuffer::{Cell, CellOp, DecodedRow, FlatRow, PlainBuffer, Row, Value};
pub use tablestore_filter::{parse, Combinator, Comparator, FilterError, FilterNode};
