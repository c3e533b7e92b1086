//! Paths into semi-structured documents.
//!
//! A path is a chain of [`PathSegment`]s, one per `/`-separated step:
//!
//! - `/name`, `/'quoted name'`, `/$name` select a struct field
//! - `/[3]` selects a list or sexp item
//! - `/*` and `/[*]` are wildcards, meaningful to data trees
//! - a trailing `?` marks a step optional
//!
//! [`PathSegment::select`] resolves a single value; multi-valued queries
//! with predicates live in [`query`].

pub mod query;

use std::fmt;

use crate::error::{EvalError, ParseError};
use crate::syntax::{Rule, SyntaxNode};
use crate::value::{Data, Kind, Value, literal};

pub use query::{PathQuery, QueryMatch, QuerySegment, QuerySelector};

/// What one path step selects from its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A named struct field, or every field when `None`.
    Property(Option<String>),
    /// A list or sexp index, or every item when `None`.
    Item(Option<usize>),
}

impl Selector {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Selector::Property(None) | Selector::Item(None))
    }

    pub fn is_property(&self) -> bool {
        matches!(self, Selector::Property(_))
    }

    /// Apply to `container`. Null containers select nothing; containers of
    /// the wrong kind are an error.
    pub fn apply<'a>(&self, container: &'a Value) -> Result<Option<&'a Value>, EvalError> {
        match (self, container.data()) {
            (Selector::Property(name), Data::Struct(fields)) => Ok(match name {
                Some(name) => container.get(name),
                None => fields.first().map(|(_, value)| value),
            }),
            (Selector::Item(index), Data::List(items) | Data::Sexp(items)) => {
                Ok(items.get(index.unwrap_or(0)))
            }
            (Selector::Property(_), Data::Null(Kind::Null | Kind::Struct)) => Ok(None),
            (Selector::Item(_), Data::Null(kind)) if *kind == Kind::Null || kind.is_sequence() => {
                Ok(None)
            }
            _ => Err(EvalError::TypeMismatch(format!(
                "{} cannot select from {}",
                self,
                container.kind()
            ))),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Property(None) => f.write_str("*"),
            Selector::Property(Some(name)) => f.write_str(&property_text(name)),
            Selector::Item(None) => f.write_str("[*]"),
            Selector::Item(Some(index)) => write!(f, "[{index}]"),
        }
    }
}

fn property_text(name: &str) -> String {
    let plain = match name.strip_prefix('$') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => {
            let mut chars = name.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    };
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub selector: Selector,
    pub required: bool,
    pub next: Option<Box<PathSegment>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Every step found a value.
    Hit,
    /// A required step found nothing.
    Miss,
    /// An optional step found nothing.
    Fallback,
}

/// Result of resolving a path: the last container reached and what it yielded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub container: &'a Value,
    pub value: Option<&'a Value>,
    pub match_type: MatchType,
}

/// How a selected value is addressed within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Property(&'a str),
    Item(usize),
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Property(name) => f.write_str(name),
            Key::Item(index) => write!(f, "{index}"),
        }
    }
}

impl PathSegment {
    pub fn new(selector: Selector, required: bool) -> Self {
        PathSegment {
            selector,
            required,
            next: None,
        }
    }

    /// Chain `(selector, required)` steps into a path; `None` when empty.
    pub fn from_steps(steps: impl IntoIterator<Item = (Selector, bool)>) -> Option<PathSegment> {
        let steps: Vec<_> = steps.into_iter().collect();
        steps.into_iter().rev().fold(None, |next, (selector, required)| {
            Some(PathSegment {
                selector,
                required,
                next: next.map(Box::new),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        std::iter::successors(Some(self), |segment| segment.next.as_deref())
    }

    /// Resolve this path against `value`.
    ///
    /// Stops at the first step that finds nothing; the match type then
    /// tells whether that step was required.
    pub fn select<'a>(&self, value: &'a Value) -> Result<Selection<'a>, EvalError> {
        let mut segment = self;
        let mut container = value;
        loop {
            match segment.selector.apply(container)? {
                Some(found) => match segment.next.as_deref() {
                    Some(next) => {
                        segment = next;
                        container = found;
                    }
                    None => {
                        return Ok(Selection {
                            container,
                            value: Some(found),
                            match_type: MatchType::Hit,
                        });
                    }
                },
                None => {
                    return Ok(Selection {
                        container,
                        value: None,
                        match_type: if segment.required {
                            MatchType::Miss
                        } else {
                            MatchType::Fallback
                        },
                    });
                }
            }
        }
    }

    /// Build from a `path` node. Predicates are rejected: only queries take them.
    pub(crate) fn from_syntax(node: &SyntaxNode) -> Result<PathSegment, ParseError> {
        let mut steps = Vec::new();
        for (step, required) in segments(node)? {
            match step {
                SegmentSyntax::Plain(selector) => steps.push((selector, required)),
                SegmentSyntax::PropertyPredicate(_) | SegmentSyntax::ItemPredicate(_) => {
                    return Err(ParseError::InvalidPath {
                        path: node.token_value().to_string(),
                        reason: "predicates are only allowed in queries".to_string(),
                    });
                }
            }
        }
        PathSegment::from_steps(steps).ok_or_else(|| ParseError::InvalidPath {
            path: node.token_value().to_string(),
            reason: "a path needs at least one segment".to_string(),
        })
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.iter() {
            write!(f, "/{}", segment.selector)?;
            if !segment.required {
                f.write_str("?")?;
            }
        }
        Ok(())
    }
}

pub(crate) enum SegmentSyntax<'i> {
    Plain(Selector),
    PropertyPredicate(SyntaxNode<'i>),
    ItemPredicate(SyntaxNode<'i>),
}

/// Decode the segments of a `path` node into selectors and required flags.
pub(crate) fn segments<'i>(node: &SyntaxNode<'i>) -> Result<Vec<(SegmentSyntax<'i>, bool)>, ParseError> {
    let invalid = |reason: String| ParseError::InvalidPath {
        path: node.token_value().to_string(),
        reason,
    };
    let mut out = Vec::new();
    for segment in node.find_nodes("path_segment") {
        let required = segment.find_node("optional_marker").is_none();
        let Some(selector) = segment.first_child() else {
            return Err(invalid("empty segment".to_string()));
        };
        let Some(inner) = selector.first_child() else {
            return Err(invalid(format!("empty selector '{}'", selector.token_value())));
        };
        let step = match inner.rule() {
            Rule::property_wildcard => SegmentSyntax::Plain(Selector::Property(None)),
            Rule::identifier | Rule::dollar_identifier => {
                SegmentSyntax::Plain(Selector::Property(Some(inner.token_value().to_string())))
            }
            Rule::quoted_symbol => {
                SegmentSyntax::Plain(Selector::Property(Some(literal::quoted_text(&inner, "symbol")?)))
            }
            Rule::item_wildcard => SegmentSyntax::Plain(Selector::Item(None)),
            Rule::item_index => {
                let index = inner
                    .token_value()
                    .parse::<usize>()
                    .map_err(|err| invalid(format!("index {}: {err}", inner.token_value())))?;
                SegmentSyntax::Plain(Selector::Item(Some(index)))
            }
            Rule::property_predicate => SegmentSyntax::PropertyPredicate(predicate_body(&inner, &invalid)?),
            Rule::item_predicate => SegmentSyntax::ItemPredicate(predicate_body(&inner, &invalid)?),
            rule => unreachable!("{rule:?} is not a path selector"),
        };
        out.push((step, required));
    }
    Ok(out)
}

fn predicate_body<'i>(
    node: &SyntaxNode<'i>,
    invalid: &impl Fn(String) -> ParseError,
) -> Result<SyntaxNode<'i>, ParseError> {
    node.find_node("expression")
        .ok_or_else(|| invalid(format!("empty predicate '{}'", node.token_value())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> PathSegment {
        let root = SyntaxNode::parse(Rule::path_root, text).unwrap();
        PathSegment::from_syntax(&root.find_node("path").unwrap()).unwrap()
    }

    #[test]
    fn parses_and_displays_segments() {
        let parsed = path("/a/'b c'/[2]?/$d/*");
        assert_eq!(parsed.to_string(), "/a/'b c'/[2]?/$d/*");
        let selectors: Vec<_> = parsed.iter().map(|s| s.selector.clone()).collect();
        assert_eq!(
            selectors,
            vec![
                Selector::Property(Some("a".into())),
                Selector::Property(Some("b c".into())),
                Selector::Item(Some(2)),
                Selector::Property(Some("$d".into())),
                Selector::Property(None),
            ]
        );
        assert!(!parsed.iter().nth(2).unwrap().required);
    }

    #[test]
    fn selects_nested_values() {
        let doc = Value::structure([(
            "a",
            Value::list([Value::int(1), Value::structure([("b", Value::string("x"))])]),
        )]);
        let selection = path("/a/[1]/b").select(&doc).unwrap();
        assert_eq!(selection.match_type, MatchType::Hit);
        assert_eq!(selection.value, Some(&Value::string("x")));
    }

    #[test]
    fn missing_steps_report_miss_or_fallback() {
        let doc = Value::structure([("a", Value::structure([("c", Value::int(1))]))]);
        assert_eq!(path("/a/b").select(&doc).unwrap().match_type, MatchType::Miss);
        let fallback = path("/a/b?").select(&doc).unwrap();
        assert_eq!(fallback.match_type, MatchType::Fallback);
        assert_eq!(fallback.container, doc.get("a").unwrap());
    }

    #[test]
    fn null_containers_select_nothing() {
        let doc = Value::structure([("a", Value::typed_null(Kind::Struct))]);
        assert_eq!(path("/a/b").select(&doc).unwrap().match_type, MatchType::Miss);
    }

    #[test]
    fn wrong_container_kind_is_an_error() {
        let doc = Value::structure([("a", Value::int(3))]);
        assert!(matches!(
            path("/a/[0]").select(&doc),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn predicates_are_rejected_in_plain_paths() {
        let root = SyntaxNode::parse(Rule::path_root, "/a/[{# > 1}]").unwrap();
        let err = PathSegment::from_syntax(&root.find_node("path").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidPath { .. }));
    }
}
