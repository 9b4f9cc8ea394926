//! Recursive-descent parser for the filter grammar.
//!
//! ```text
//! expr     := or
//! or       := and ("OR" and)*
//! and      := unary ("AND" unary)*
//! unary    := "NOT" unary | relation
//! relation := IDENT comparator "@" IDENT BOOL [BOOL]
//! ```
//!
//! `AND` binds tighter than `OR`; both fold left, so `a AND b AND c` becomes
//! `AND(AND(a, b), c)`. Trees deeper than [`MAX_DEPTH`] composites are
//! rejected with a syntax error at the keyword that crosses the limit.

use crate::{
    ast::{Comparator, FilterNode, Relation, MAX_DEPTH},
    error::{FilterError, FilterResult},
};

const KEYWORDS: [&str; 3] = ["AND", "OR", "NOT"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind<'a> {
    Word(&'a str),
    Op(&'a str),
    At,
}

#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    kind: TokenKind<'a>,
    offset: usize,
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self.kind {
            TokenKind::Word(word) => format!("'{word}'"),
            TokenKind::Op(op) => format!("'{op}'"),
            TokenKind::At => "'@'".to_string(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_op_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>')
}

fn tokenize(source: &str) -> FilterResult<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = if is_ident_start(c) {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            TokenKind::Word(&source[start..end])
        } else if is_op_char(c) {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !is_op_char(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            TokenKind::Op(&source[start..end])
        } else if c == '@' {
            chars.next();
            TokenKind::At
        } else {
            return Err(FilterError::syntax(
                start,
                format!("unexpected character '{c}'"),
            ));
        };

        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    end: usize,
    not_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Word(word), .. }) if word == keyword)
    }

    fn error_expected(&self, what: &str) -> FilterError {
        match self.peek() {
            Some(token) => FilterError::syntax(
                token.offset,
                format!("expected {what}, found {}", token.describe()),
            ),
            None => FilterError::syntax(self.end, format!("expected {what}, found end of input")),
        }
    }

    /// Consumes `keyword` and returns its offset.
    fn eat_keyword(&mut self, keyword: &str) -> Option<usize> {
        let token = self.peek()?;
        if !self.peek_keyword(keyword) {
            return None;
        }
        self.pos += 1;
        Some(token.offset)
    }

    // Each parse step returns the node with its composite depth.

    fn parse_or(&mut self) -> FilterResult<(FilterNode, usize)> {
        let (mut lhs, mut depth) = self.parse_and()?;
        while let Some(offset) = self.eat_keyword("OR") {
            let (rhs, rhs_depth) = self.parse_and()?;
            depth = deepen(depth.max(rhs_depth), offset)?;
            lhs = FilterNode::or(lhs, rhs);
        }
        Ok((lhs, depth))
    }

    fn parse_and(&mut self) -> FilterResult<(FilterNode, usize)> {
        let (mut lhs, mut depth) = self.parse_unary()?;
        while let Some(offset) = self.eat_keyword("AND") {
            let (rhs, rhs_depth) = self.parse_unary()?;
            depth = deepen(depth.max(rhs_depth), offset)?;
            lhs = FilterNode::and(lhs, rhs);
        }
        Ok((lhs, depth))
    }

    fn parse_unary(&mut self) -> FilterResult<(FilterNode, usize)> {
        if let Some(offset) = self.eat_keyword("NOT") {
            // Checked before descending so the recursion itself stays bounded.
            self.not_depth = deepen(self.not_depth, offset)?;
            let (child, depth) = self.parse_unary()?;
            self.not_depth -= 1;
            return Ok((FilterNode::not(child), deepen(depth, offset)?));
        }
        Ok((self.parse_relation()?, 0))
    }

    fn parse_relation(&mut self) -> FilterResult<FilterNode> {
        let column = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) if !KEYWORDS.contains(&word) => word,
            _ => return Err(self.error_expected("column name")),
        };
        self.pos += 1;

        let comparator = match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                offset,
            }) => Comparator::from_symbol(op).map_err(|_| {
                FilterError::syntax(offset, format!("unknown comparator '{op}'"))
            })?,
            _ => return Err(self.error_expected("comparator")),
        };
        self.pos += 1;

        match self.peek() {
            Some(Token {
                kind: TokenKind::At,
                ..
            }) => self.pos += 1,
            _ => return Err(self.error_expected("'@'")),
        }

        let param = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => word,
            _ => return Err(self.error_expected("parameter name")),
        };
        self.pos += 1;

        let pass_if_missing = match self.parse_bool() {
            Some(value) => value,
            None => return Err(self.error_expected("'true' or 'false'")),
        };
        let latest_version_only = self.parse_bool();

        Ok(FilterNode::Relation(Relation {
            column: column.to_string(),
            comparator,
            param: param.to_string(),
            pass_if_missing,
            latest_version_only,
        }))
    }

    fn parse_bool(&mut self) -> Option<bool> {
        let value = match self.peek()?.kind {
            TokenKind::Word("true") => true,
            TokenKind::Word("false") => false,
            _ => return None,
        };
        self.pos += 1;
        Some(value)
    }
}

fn deepen(depth: usize, offset: usize) -> FilterResult<usize> {
    if depth >= MAX_DEPTH {
        return Err(FilterError::syntax(
            offset,
            format!("filter nests deeper than {MAX_DEPTH} levels"),
        ));
    }
    Ok(depth + 1)
}

/// Parses filter text into a [`FilterNode`] tree.
///
/// Tokens are separated by whitespace; comparators and `@` may also abut the
/// surrounding identifiers. Any malformed input yields
/// [`FilterError::Syntax`] carrying the byte offset of the offending token.
pub fn parse(source: &str) -> FilterResult<FilterNode> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        not_depth: 0,
    };
    let (node, _) = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(FilterError::syntax(
            token.offset,
            format!("unexpected trailing input {}", token.describe()),
        ));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Combinator;

    fn relation(column: &str, cmp: &str, param: &str, pass: bool) -> FilterNode {
        FilterNode::relation(column, cmp, param, pass).unwrap()
    }

    #[test]
    fn parses_single_relation() {
        let node = parse("a == @x true").unwrap();
        assert_eq!(
            node,
            FilterNode::Relation(Relation {
                column: "a".into(),
                comparator: Comparator::Equal,
                param: "x".into(),
                pass_if_missing: true,
                latest_version_only: None,
            })
        );
    }

    #[test]
    fn parses_latest_version_flag() {
        let node = parse("name == @name true false").unwrap();
        let relation = node.as_relation().unwrap();
        assert!(relation.pass_if_missing);
        assert_eq!(relation.latest_version_only, Some(false));
    }

    #[test]
    fn and_of_two_relations() {
        let node = parse("a > @x true AND b <= @y false").unwrap();
        assert_eq!(
            node,
            FilterNode::and(relation("a", ">", "x", true), relation("b", "<=", "y", false))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let node = parse("a > @x true OR b <= @y false AND c == @z true").unwrap();
        let expected = FilterNode::or(
            relation("a", ">", "x", true),
            FilterNode::and(relation("b", "<=", "y", false), relation("c", "==", "z", true)),
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn chains_fold_left() {
        let node = parse("a == @x true AND b == @y true AND c == @z true").unwrap();
        let expected = FilterNode::and(
            FilterNode::and(relation("a", "==", "x", true), relation("b", "==", "y", true)),
            relation("c", "==", "z", true),
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn nested_not() {
        let node = parse("NOT NOT a == @x true").unwrap();
        let outer = node.as_composite().unwrap();
        assert_eq!(outer.combinator(), Combinator::Not);
        assert_eq!(outer.children().len(), 1);
        let inner = outer.children()[0].as_composite().unwrap();
        assert_eq!(inner.combinator(), Combinator::Not);
        assert_eq!(inner.children().len(), 1);
        assert_eq!(inner.children()[0], relation("a", "==", "x", true));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let node = parse("NOT a > @x true AND b <= @y false").unwrap();
        let expected = FilterNode::and(
            FilterNode::not(relation("a", ">", "x", true)),
            relation("b", "<=", "y", false),
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn operators_may_abut_identifiers() {
        assert_eq!(parse("a>=@x false").unwrap(), relation("a", ">=", "x", false));
    }

    #[test]
    fn rejects_unknown_comparator() {
        let err = parse("a => @x true").unwrap_err();
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("a == @x true true true").unwrap_err();
        assert_eq!(err.offset(), Some(18));

        let err = parse("a == @x true b").unwrap_err();
        assert_eq!(err.offset(), Some(13));
    }

    #[test]
    fn rejects_bad_tokens() {
        assert_eq!(parse("a == @x tru").unwrap_err().offset(), Some(8));
        assert_eq!(parse("a == x true").unwrap_err().offset(), Some(5));
        assert_eq!(parse("a == @x true AND").unwrap_err().offset(), Some(16));
        assert_eq!(parse("").unwrap_err().offset(), Some(0));
        assert_eq!(parse("a == @x #").unwrap_err().offset(), Some(8));
        assert_eq!(parse("AND == @x true").unwrap_err().offset(), Some(0));
    }

    #[test]
    fn deep_negation_is_a_syntax_error() {
        let source = format!("{}a == @x true", "NOT ".repeat(200_000));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.offset(), Some(4 * MAX_DEPTH));

        let source = format!("{}a == @x true", "NOT ".repeat(MAX_DEPTH));
        let mut node = parse(&source).unwrap();
        for _ in 0..MAX_DEPTH {
            node = node.as_composite().unwrap().children()[0].clone();
        }
        assert_eq!(node, relation("a", "==", "x", true));
    }

    #[test]
    fn long_chains_are_capped() {
        let clause = "a == @x true";
        let source = vec![clause; 200_000].join(" AND ");
        let err = parse(&source).unwrap_err();
        // Offset of the AND that would add level MAX_DEPTH + 1.
        let k = MAX_DEPTH + 1;
        assert_eq!(err.offset(), Some(clause.len() * k + 5 * (k - 1) + 1));

        let source = vec![clause; MAX_DEPTH + 1].join(" OR ");
        assert!(parse(&source).is_ok());
    }

    #[test]
    fn display_round_trips() {
        let source = "a > @x true OR NOT b <= @y false true AND c != @z false";
        let node = parse(source).unwrap();
        assert_eq!(node.to_string(), source);
        assert_eq!(parse(&node.to_string()).unwrap(), node);
    }
}
