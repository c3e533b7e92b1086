//! Multi-valued path queries.
//!
//! A query is a path whose steps may select many values at once. Besides
//! names, indices and wildcards, a step may carry a predicate evaluated
//! once per candidate child:
//!
//! ```text
//! /FamilyTree/.{# ends with "ther"}     fields whose name ends in "ther"
//! /items/[{@/price > 10}]               items whose price exceeds 10
//! ```
//!
//! Inside a predicate `#` is the candidate's key (field name or index) and
//! `@` the candidate itself. Queries are lenient about shape: a step simply
//! yields nothing for containers it cannot look into.

use std::fmt;

use super::{Key, Selector};
use crate::ast::Expression;
use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use crate::value::{Data, Value};

#[derive(Debug, Clone)]
pub enum QuerySelector {
    Plain(Selector),
    PropertyWhere(Expression),
    ItemWhere(Expression),
}

#[derive(Debug, Clone)]
pub struct QuerySegment {
    pub selector: QuerySelector,
}

#[derive(Debug, Clone)]
pub struct PathQuery {
    segments: Vec<QuerySegment>,
}

/// One value found by a query, with the key that addresses it in its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryMatch<'a> {
    pub key: Key<'a>,
    pub value: &'a Value,
}

impl PathQuery {
    pub fn new(segments: Vec<QuerySegment>) -> Self {
        PathQuery { segments }
    }

    pub fn segments(&self) -> &[QuerySegment] {
        &self.segments
    }

    /// Every value the query reaches in `document`, in document order.
    pub fn select_all<'a>(&self, document: &'a Value) -> Result<Vec<QueryMatch<'a>>, EvalError> {
        let mut frontier: Vec<(Option<Key<'a>>, &'a Value)> = vec![(None, document)];
        for segment in &self.segments {
            let mut next = Vec::new();
            for &(_, container) in &frontier {
                segment.expand(container, document, &mut next)?;
            }
            log::trace!("query step {segment} kept {} of {} candidates", next.len(), frontier.len());
            frontier = next;
        }
        Ok(frontier
            .into_iter()
            .filter_map(|(key, value)| key.map(|key| QueryMatch { key, value }))
            .collect())
    }
}

impl QuerySegment {
    fn expand<'a>(
        &self,
        container: &'a Value,
        document: &'a Value,
        out: &mut Vec<(Option<Key<'a>>, &'a Value)>,
    ) -> Result<(), EvalError> {
        match (&self.selector, container.data()) {
            (QuerySelector::Plain(Selector::Property(name)), Data::Struct(fields)) => {
                match name {
                    Some(name) => {
                        if let Some((field, value)) = fields.iter().find(|(field, _)| field == name) {
                            out.push((Some(Key::Property(field)), value));
                        }
                    }
                    None => out.extend(fields.iter().map(|(f, v)| (Some(Key::Property(f.as_str())), v))),
                }
            }
            (QuerySelector::Plain(Selector::Item(index)), Data::List(items) | Data::Sexp(items)) => {
                match index {
                    Some(index) => {
                        if let Some(value) = items.get(*index) {
                            out.push((Some(Key::Item(*index)), value));
                        }
                    }
                    None => out.extend(items.iter().enumerate().map(|(i, v)| (Some(Key::Item(i)), v))),
                }
            }
            (QuerySelector::PropertyWhere(predicate), Data::Struct(fields)) => {
                for (field, value) in fields {
                    let key = Key::Property(field);
                    if accepts(predicate, document, key, value)? {
                        out.push((Some(key), value));
                    }
                }
            }
            (QuerySelector::ItemWhere(predicate), Data::List(items) | Data::Sexp(items)) => {
                for (index, value) in items.iter().enumerate() {
                    let key = Key::Item(index);
                    if accepts(predicate, document, key, value)? {
                        out.push((Some(key), value));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn accepts(
    predicate: &Expression,
    document: &Value,
    key: Key<'_>,
    value: &Value,
) -> Result<bool, EvalError> {
    let context = EvaluationContext::new(document).with_current(key, value);
    let verdict = predicate.evaluate(&context)?;
    match verdict.data() {
        Data::Bool(keep) => Ok(*keep),
        Data::Null(_) => Ok(false),
        _ => Err(EvalError::TypeMismatch(format!(
            "predicate {predicate} produced {} instead of bool",
            verdict.kind()
        ))),
    }
}

impl fmt::Display for QuerySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            QuerySelector::Plain(selector) => write!(f, "/{selector}"),
            QuerySelector::PropertyWhere(predicate) => write!(f, "/.{{{predicate}}}"),
            QuerySelector::ItemWhere(predicate) => write!(f, "/[{{{predicate}}}]"),
        }
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
