use thiserror::Error;

/// Result alias used throughout the filter crate.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while parsing or assembling filter trees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Malformed filter text; `offset` is the byte offset of the offending token.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset into the source text.
        offset: usize,
        /// Human readable description.
        message: String,
    },
    /// Comparator symbol outside `== != > >= < <=`.
    #[error("unsupported comparator '{0}'")]
    UnsupportedComparator(String),
    /// Combinator keyword outside `NOT AND OR`.
    #[error("unsupported combinator '{0}'")]
    UnsupportedCombinator(String),
    /// Tree nests more composites than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("filter nests deeper than {limit} levels")]
    NestingTooDeep {
        /// Maximum accepted nesting depth.
        limit: usize,
    },
    /// Composite built with the wrong number of children.
    #[error("invalid arity for {combinator}: expected {expected}, got {got}")]
    InvalidArity {
        /// Combinator keyword.
        combinator: &'static str,
        /// Accepted child count.
        expected: &'static str,
        /// Supplied child count.
        got: usize,
    },
}

impl FilterError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        FilterError::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Source offset carried by syntax errors.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            FilterError::Syntax { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
