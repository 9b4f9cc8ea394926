#![deny(missing_docs)]
//! TableStore filter facade crate.
//!
//! Filters are written as small boolean expressions over column values, for
//! example `age >= @min true AND NOT name == @banned false`. Right-hand sides
//! are always named parameters (`@min`) resolved later against caller
//! bindings, so the parsed tree never contains literal values. Lowering the
//! tree into the service's binary filter records lives in the codec crate.

mod ast;
mod error;
mod parser;

pub use ast::{Combinator, Comparator, Composite, FilterNode, Relation, MAX_DEPTH};
pub use error::{FilterError, FilterResult};
pub use parser::parse;
