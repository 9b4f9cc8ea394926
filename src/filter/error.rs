use tablestore_filter::FilterError;
use thiserror::Error;

use crate::plainbuffer::CodecError;

/// Result alias for filter compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while resolving or encoding a filter tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A relation references `@name` but no binding supplies it.
    #[error("missing parameter '@{0}'")]
    MissingParameter(String),
    /// A bound value cannot be used as a filter operand.
    #[error("operand '{name}': {source}")]
    Value {
        /// Parameter or column the value belongs to.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },
    /// The tree itself is malformed, e.g. nested past the depth limit.
    #[error(transparent)]
    Filter(#[from] FilterError),
}
