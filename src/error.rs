//! Error taxonomy shared by parsing, evaluation, selection and pruning.
//!
//! Each concern gets its own enum so callers can match on exactly the
//! failures they are able to handle. Only [`EvalError::SelectionMiss`] and
//! [`EvalError::MismatchedSelectionType`] are ever recovered locally (by the
//! existence and type-check operations); everything else reaches the caller.

use thiserror::Error;

use crate::value::Kind;

/// The grammar failed to recognise the input text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("syntax error in {rule} at line {line}, column {column}: expected {expected}")]
    Unexpected {
        rule: String,
        line: usize,
        column: usize,
        expected: String,
    },

    #[error("grammar error in {rule} at line {line}, column {column}: {message}")]
    Internal {
        rule: String,
        line: usize,
        column: usize,
        message: String,
    },
}

/// Violations of the operand/operator alternation the precedence grouper expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    #[error("malformed operator sequence at item {position}: expected {expected}")]
    MalformedOperatorSequence {
        position: usize,
        expected: &'static str,
    },

    #[error("an operator group needs at least two operands, found {found}")]
    InsufficientOperands { found: usize },

    #[error("operator {operator} has no precedence tier")]
    UnrankedOperator { operator: String },
}

/// Failures while turning text into an expression, path, query or value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("invalid {kind} literal '{text}': {reason}")]
    InvalidLiteral {
        kind: &'static str,
        text: String,
        reason: String,
    },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl ParseError {
    pub(crate) fn literal(kind: &'static str, text: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidLiteral {
            kind,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures while evaluating an expression or applying a selector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("no value selected at {path}")]
    SelectionMiss { path: String },

    #[error("expected {expected} at {path}, found {found}")]
    MismatchedSelectionType {
        path: String,
        expected: String,
        found: Kind,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow in {0}")]
    Overflow(String),

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{0} can only be used inside a path predicate")]
    NoCurrentNode(&'static str),
}

impl EvalError {
    /// True for the two failures existence and type checks turn into `false`.
    pub fn is_selection_failure(&self) -> bool {
        matches!(
            self,
            EvalError::SelectionMiss { .. } | EvalError::MismatchedSelectionType { .. }
        )
    }
}

/// Data tree construction invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("children of {node} mix property and item selectors")]
    NonHomogeneousChildren { node: String },
}

/// Failures while pruning a document down to a data tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PruneError {
    #[error("missing required property '{0}'")]
    MissingRequiredProperty(String),

    #[error("missing required index [{0}]")]
    MissingRequiredIndex(usize),

    #[error("required container {selector} is null")]
    MissingRequiredContainer { selector: String },

    #[error("required container {selector} has no children")]
    EmptyRequiredContainer { selector: String },

    #[error("expected {expected} at {selector}, found {found}")]
    StructureMismatch {
        selector: String,
        expected: &'static str,
        found: Kind,
    },
}
