//! Thin adapter over the pest-generated parser.
//!
//! The builders in [`crate::parser`] and [`crate::value`] only ever see
//! [`SyntaxNode`]s: a rule, its children and the text it covers. Child
//! lookups take a small query language of rule names where `.` descends one
//! level and `|` accepts alternatives, e.g. `"ts_time.ts_hour"` or
//! `"identifier|quoted_symbol"`.

use std::fmt;

use pest::Parser as _;
use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::SyntaxError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct Grammar;

#[derive(Clone)]
pub struct SyntaxNode<'i> {
    pair: Pair<'i, Rule>,
}

impl<'i> SyntaxNode<'i> {
    /// Parse `input` starting from the entry rule `rule`.
    pub fn parse(rule: Rule, input: &'i str) -> Result<SyntaxNode<'i>, SyntaxError> {
        let mut pairs = Grammar::parse(rule, input).map_err(|err| syntax_error(rule, err))?;
        match pairs.next() {
            Some(pair) => Ok(SyntaxNode { pair }),
            None => Err(SyntaxError::Internal {
                rule: rule_name(rule),
                line: 1,
                column: 1,
                message: "grammar produced no tree".to_string(),
            }),
        }
    }

    pub fn rule(&self) -> Rule {
        self.pair.as_rule()
    }

    pub fn rule_name(&self) -> String {
        rule_name(self.rule())
    }

    /// The exact source text this node covers.
    pub fn token_value(&self) -> &'i str {
        self.pair.as_str()
    }

    /// One-based line and column of the node's first character.
    pub fn position(&self) -> (usize, usize) {
        self.pair.line_col()
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxNode<'i>> + use<'i> {
        self.pair.clone().into_inner().map(|pair| SyntaxNode { pair })
    }

    pub fn first_child(&self) -> Option<SyntaxNode<'i>> {
        self.children().next()
    }

    pub fn child_count(&self) -> usize {
        self.pair.clone().into_inner().count()
    }

    pub fn find_node(&self, query: &str) -> Option<SyntaxNode<'i>> {
        self.find_nodes(query).into_iter().next()
    }

    /// Every node reachable from this one by following `query`.
    pub fn find_nodes(&self, query: &str) -> Vec<SyntaxNode<'i>> {
        let mut frontier = vec![self.clone()];
        for step in query.split('.') {
            let names: Vec<&str> = step.split('|').map(str::trim).collect();
            frontier = frontier
                .iter()
                .flat_map(|node| node.children())
                .filter(|child| names.iter().any(|name| *name == child.rule_name()))
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.rule_name(), self.token_value())
    }
}

pub fn rule_name(rule: Rule) -> String {
    format!("{rule:?}")
}

fn syntax_error(rule: Rule, err: pest::error::Error<Rule>) -> SyntaxError {
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    match err.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            let expected = if positives.is_empty() {
                "end of input".to_string()
            } else {
                positives
                    .iter()
                    .map(|rule| rule_name(*rule))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            SyntaxError::Unexpected {
                rule: rule_name(rule),
                line,
                column,
                expected,
            }
        }
        ErrorVariant::CustomError { message } => SyntaxError::Internal {
            rule: rule_name(rule),
            line,
            column,
            message,
        },
    }
}
