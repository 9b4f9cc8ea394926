//! Filter tree structures shared by the parser and the codec-side compiler.

use std::{fmt, str::FromStr};

use crate::error::{FilterError, FilterResult};

/// Deepest chain of composite nodes a filter may contain.
pub const MAX_DEPTH: usize = 100;

/// Comparison operator of a single-column relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Equals (`==`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessEqual,
}

impl Comparator {
    /// Returns the textual symbol used by the filter grammar.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterEqual => ">=",
            Comparator::LessThan => "<",
            Comparator::LessEqual => "<=",
        }
    }

    /// Maps a grammar symbol onto its comparator.
    pub fn from_symbol(symbol: &str) -> FilterResult<Self> {
        match symbol {
            "==" => Ok(Comparator::Equal),
            "!=" => Ok(Comparator::NotEqual),
            ">" => Ok(Comparator::GreaterThan),
            ">=" => Ok(Comparator::GreaterEqual),
            "<" => Ok(Comparator::LessThan),
            "<=" => Ok(Comparator::LessEqual),
            other => Err(FilterError::UnsupportedComparator(other.to_string())),
        }
    }
}

impl FromStr for Comparator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Comparator::from_symbol(s)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator joining filter clauses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Negation, exactly one child.
    Not,
    /// Conjunction, at least two children.
    And,
    /// Disjunction, at least two children.
    Or,
}

impl Combinator {
    /// Returns the grammar keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::Not => "NOT",
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }

    /// Maps a grammar keyword onto its combinator.
    pub fn from_symbol(symbol: &str) -> FilterResult<Self> {
        match symbol {
            "NOT" => Ok(Combinator::Not),
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            other => Err(FilterError::UnsupportedCombinator(other.to_string())),
        }
    }

    fn check_arity(self, got: usize) -> FilterResult<()> {
        let (ok, expected) = match self {
            Combinator::Not => (got == 1, "1"),
            Combinator::And | Combinator::Or => (got >= 2, ">=2"),
        };
        if ok {
            Ok(())
        } else {
            Err(FilterError::InvalidArity {
                combinator: self.as_str(),
                expected,
                got,
            })
        }
    }
}

impl FromStr for Combinator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Combinator::from_symbol(s)
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `column <comparator> @param passIfMissing [latestVersionOnly]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    /// Column the relation reads.
    pub column: String,
    /// Comparison applied to the column value.
    pub comparator: Comparator,
    /// Name of the binding supplying the right-hand value (without `@`).
    pub param: String,
    /// Whether rows lacking the column pass the filter.
    pub pass_if_missing: bool,
    /// Whether only the newest version of the column is compared.
    pub latest_version_only: Option<bool>,
}

/// Logical node over one or more child filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composite {
    combinator: Combinator,
    children: Vec<FilterNode>,
}

impl Composite {
    /// Logical operator of this node.
    #[must_use]
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Ordered children.
    #[must_use]
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }
}

/// Parsed filter expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterNode {
    /// Single-column comparison.
    Relation(Relation),
    /// Logical combination of child filters.
    Composite(Composite),
}

impl FilterNode {
    /// Builds a relation leaf from a comparator symbol.
    pub fn relation(
        column: impl Into<String>,
        comparator: &str,
        param: impl Into<String>,
        pass_if_missing: bool,
    ) -> FilterResult<Self> {
        Ok(FilterNode::Relation(Relation {
            column: column.into(),
            comparator: Comparator::from_symbol(comparator)?,
            param: param.into(),
            pass_if_missing,
            latest_version_only: None,
        }))
    }

    /// Builds a composite from a combinator keyword, validating its arity.
    pub fn composite(combinator: &str, children: Vec<FilterNode>) -> FilterResult<Self> {
        let combinator = Combinator::from_symbol(combinator)?;
        combinator.check_arity(children.len())?;
        Ok(FilterNode::Composite(Composite {
            combinator,
            children,
        }))
    }

    /// Negates `child`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: FilterNode) -> Self {
        FilterNode::Composite(Composite {
            combinator: Combinator::Not,
            children: vec![child],
        })
    }

    /// Conjunction of two clauses.
    #[must_use]
    pub fn and(lhs: FilterNode, rhs: FilterNode) -> Self {
        FilterNode::Composite(Composite {
            combinator: Combinator::And,
            children: vec![lhs, rhs],
        })
    }

    /// Disjunction of two clauses.
    #[must_use]
    pub fn or(lhs: FilterNode, rhs: FilterNode) -> Self {
        FilterNode::Composite(Composite {
            combinator: Combinator::Or,
            children: vec![lhs, rhs],
        })
    }

    /// Sets the latest-version-only flag on a relation; composites are returned unchanged.
    #[must_use]
    pub fn latest_version_only(self, latest: bool) -> Self {
        match self {
            FilterNode::Relation(relation) => FilterNode::Relation(Relation {
                latest_version_only: Some(latest),
                ..relation
            }),
            composite => composite,
        }
    }

    /// Returns the relation when this node is a leaf.
    #[must_use]
    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            FilterNode::Relation(relation) => Some(relation),
            FilterNode::Composite(_) => None,
        }
    }

    /// Returns the composite when this node is an inner node.
    #[must_use]
    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            FilterNode::Relation(_) => None,
            FilterNode::Composite(composite) => Some(composite),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @{} {}",
            self.column, self.comparator, self.param, self.pass_if_missing
        )?;
        if let Some(latest) = self.latest_version_only {
            write!(f, " {latest}")?;
        }
        Ok(())
    }
}

/// Renders the node in grammar form. The grammar has no parentheses, so only
/// trees whose shape matches operator precedence parse back to themselves.
impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Relation(relation) => relation.fmt(f),
            FilterNode::Composite(composite) => match composite.combinator {
                Combinator::Not => write!(f, "NOT {}", composite.children[0]),
                combinator => {
                    for (i, child) in composite.children.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {combinator} ")?;
                        }
                        child.fmt(f)?;
                    }
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_symbols_round_trip() {
        for cmp in [
            Comparator::Equal,
            Comparator::NotEqual,
            Comparator::GreaterThan,
            Comparator::GreaterEqual,
            Comparator::LessThan,
            Comparator::LessEqual,
        ] {
            assert_eq!(cmp.as_str().parse::<Comparator>().unwrap(), cmp);
        }
        assert_eq!(
            Comparator::from_symbol("=~"),
            Err(FilterError::UnsupportedComparator("=~".into()))
        );
    }

    #[test]
    fn composite_checks_arity() {
        let leaf = FilterNode::relation("a", "==", "x", true).unwrap();
        let err = FilterNode::composite("NOT", vec![leaf.clone(), leaf.clone()]).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidArity {
                combinator: "NOT",
                expected: "1",
                got: 2
            }
        );

        let err = FilterNode::composite("AND", vec![leaf.clone()]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidArity { got: 1, .. }));

        let err = FilterNode::composite("XOR", vec![leaf.clone(), leaf]).unwrap_err();
        assert_eq!(err, FilterError::UnsupportedCombinator("XOR".into()));
    }

    #[test]
    fn display_renders_grammar() {
        let a = FilterNode::relation("a", ">", "x", true).unwrap();
        let b = FilterNode::relation("b", "<=", "y", false)
            .unwrap()
            .latest_version_only(true);
        let node = FilterNode::or(a, FilterNode::not(b));
        assert_eq!(node.to_string(), "a > @x true OR NOT b <= @y false true");
    }
}
