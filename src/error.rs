use tablestore_filter::FilterError;
use thiserror::Error;

use crate::{filter::CompileError, plainbuffer::CodecError};

/// Result alias for the one-call helpers.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure raised by this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// PlainBuffer encode or decode failed.
    #[error("plainbuffer: {0}")]
    Codec(#[from] CodecError),
    /// Filter text or tree is malformed.
    #[error("filter: {0}")]
    Filter(#[from] FilterError),
    /// Filter could not be compiled against its bindings.
    #[error("compile: {0}")]
    Compile(#[from] CompileError),
}
