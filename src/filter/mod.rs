//! Lowers a parsed [`FilterNode`] tree into the service's filter records.
//!
//! Compilation runs in two stages. [`resolve`] substitutes bound parameters
//! and yields a [`ResolvedFilter`], a typed tree that still exposes every
//! relation. [`ResolvedFilter::encode`] then serializes it bottom-up: each
//! child is encoded on its own and embedded in its parent as an opaque
//! [`proto::Filter`].

mod error;
pub mod proto;

use std::collections::HashMap;

use prost::Message;
use tablestore_filter::{Combinator, Comparator, FilterError, FilterNode, MAX_DEPTH};

pub use error::{CompileError, CompileResult};

use crate::{
    logging::codec_log,
    plainbuffer::{CodecError, Value},
};
use proto::{
    ComparatorType, CompositeColumnValueFilter, FilterType, LogicalOperator,
    SingleColumnValueFilter,
};

/// Values supplied for the `@name` parameters of a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    /// No bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` (without the leading `@`) to `value`, replacing any
    /// earlier binding.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Bindings
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Filter tree with every parameter replaced by its bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFilter {
    /// Comparison of one column against a value.
    SingleColumnValue {
        /// Comparison applied.
        comparator: Comparator,
        /// Column compared.
        column: String,
        /// Right-hand operand.
        value: Value,
        /// Whether rows lacking the column pass.
        pass_if_missing: bool,
        /// Whether only the newest version is compared.
        latest_version_only: Option<bool>,
    },
    /// Logical combination of resolved children.
    Composite {
        /// Logical operator.
        combinator: Combinator,
        /// Children in source order.
        children: Vec<ResolvedFilter>,
    },
}

/// Encoded filter record tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    kind: FilterType,
    bytes: Vec<u8>,
}

impl CompiledFilter {
    /// Kind of record held in [`bytes`](Self::bytes).
    #[must_use]
    pub fn kind(&self) -> FilterType {
        self.kind
    }

    /// Encoded `SingleColumnValueFilter` or `CompositeColumnValueFilter`.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Wraps this record in a [`proto::Filter`].
    #[must_use]
    pub fn to_filter(&self) -> proto::Filter {
        proto::Filter {
            r#type: self.kind as i32,
            filter: self.bytes.clone(),
        }
    }

    /// Bytes of the enclosing [`proto::Filter`], as a read request carries them.
    #[must_use]
    pub fn to_filter_bytes(&self) -> Vec<u8> {
        self.to_filter().encode_to_vec()
    }
}

fn comparator_code(comparator: Comparator) -> ComparatorType {
    match comparator {
        Comparator::Equal => ComparatorType::Equal,
        Comparator::NotEqual => ComparatorType::NotEqual,
        Comparator::GreaterThan => ComparatorType::GreaterThan,
        Comparator::GreaterEqual => ComparatorType::GreaterEqual,
        Comparator::LessThan => ComparatorType::LessThan,
        Comparator::LessEqual => ComparatorType::LessEqual,
    }
}

fn combinator_code(combinator: Combinator) -> LogicalOperator {
    match combinator {
        Combinator::Not => LogicalOperator::Not,
        Combinator::And => LogicalOperator::And,
        Combinator::Or => LogicalOperator::Or,
    }
}

fn check_depth(depth: usize) -> CompileResult<()> {
    if depth > MAX_DEPTH {
        return Err(FilterError::NestingTooDeep { limit: MAX_DEPTH }.into());
    }
    Ok(())
}

/// Substitutes `bindings` into `node`.
///
/// Only strings, numbers, booleans, blobs and the two sentinels are valid
/// operands; `Null` and `AutoIncrement` bindings are rejected. Trees built
/// by hand with more than [`MAX_DEPTH`] nested composites are rejected with
/// [`FilterError::NestingTooDeep`].
pub fn resolve(node: &FilterNode, bindings: &Bindings) -> CompileResult<ResolvedFilter> {
    resolve_at(node, bindings, 0)
}

fn resolve_at(
    node: &FilterNode,
    bindings: &Bindings,
    depth: usize,
) -> CompileResult<ResolvedFilter> {
    match node {
        FilterNode::Relation(relation) => {
            let value = bindings
                .get(&relation.param)
                .ok_or_else(|| CompileError::MissingParameter(relation.param.clone()))?;
            if matches!(value, Value::Null | Value::AutoIncrement) {
                return Err(CompileError::Value {
                    name: relation.param.clone(),
                    source: CodecError::UnsupportedInput("filter operand"),
                });
            }
            Ok(ResolvedFilter::SingleColumnValue {
                comparator: relation.comparator,
                column: relation.column.clone(),
                value: value.clone(),
                pass_if_missing: relation.pass_if_missing,
                latest_version_only: relation.latest_version_only,
            })
        }
        FilterNode::Composite(composite) => {
            check_depth(depth + 1)?;
            Ok(ResolvedFilter::Composite {
                combinator: composite.combinator(),
                children: composite
                    .children()
                    .iter()
                    .map(|child| resolve_at(child, bindings, depth + 1))
                    .collect::<CompileResult<_>>()?,
            })
        }
    }
}

impl ResolvedFilter {
    /// Serializes the tree bottom-up.
    pub fn encode(&self) -> CompileResult<CompiledFilter> {
        self.encode_at(0)
    }

    fn encode_at(&self, depth: usize) -> CompileResult<CompiledFilter> {
        match self {
            ResolvedFilter::SingleColumnValue {
                comparator,
                column,
                value,
                pass_if_missing,
                latest_version_only,
            } => {
                let record = SingleColumnValueFilter {
                    comparator: comparator_code(*comparator) as i32,
                    column_name: column.clone(),
                    column_value: value.encode().map_err(|source| CompileError::Value {
                        name: column.clone(),
                        source,
                    })?,
                    pass_if_missing: *pass_if_missing,
                    latest_version_only: *latest_version_only,
                };
                Ok(CompiledFilter {
                    kind: FilterType::SingleColumnValue,
                    bytes: record.encode_to_vec(),
                })
            }
            ResolvedFilter::Composite {
                combinator,
                children,
            } => {
                check_depth(depth + 1)?;
                let sub_filters = children
                    .iter()
                    .map(|child| {
                        child
                            .encode_at(depth + 1)
                            .map(|compiled| compiled.to_filter())
                    })
                    .collect::<CompileResult<_>>()?;
                let record = CompositeColumnValueFilter {
                    combinator: combinator_code(*combinator) as i32,
                    sub_filters,
                };
                Ok(CompiledFilter {
                    kind: FilterType::CompositeColumnValue,
                    bytes: record.encode_to_vec(),
                })
            }
        }
    }
}

/// Resolves `node` against `bindings` and encodes the result.
pub fn compile(node: &FilterNode, bindings: &Bindings) -> CompileResult<CompiledFilter> {
    let compiled = resolve(node, bindings)?.encode()?;
    codec_log!(
        log::Level::Trace,
        "filter_compiled",
        "kind={:?} bytes={}",
        compiled.kind,
        compiled.bytes.len()
    );
    Ok(compiled)
}

/// Parses `source`, compiles it with `bindings` and returns the bytes of the
/// root [`proto::Filter`].
pub fn make_filter(source: &str, bindings: &Bindings) -> crate::Result<Vec<u8>> {
    let node = tablestore_filter::parse(source)?;
    Ok(compile(&node, bindings)?.to_filter_bytes())
}
