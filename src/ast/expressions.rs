use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::kinds::{ExpressionKind, KindTest};
use super::operators::{
    ArithmeticOperator, BinaryOperator, LogicalOperator, MatchOperator, OperatorClass,
    ParametrizedOperator, RelationalOperator, TemporalOperator,
};
use crate::error::{EvalError, ParseError};
use crate::matching::RegexCache;
use crate::output::to_text;
use crate::path::PathSegment;
use crate::value::Value;

/// A parsed, kind-checked expression.
///
/// Built by [`crate::parser::Parser`]; evaluated with
/// [`Expression::evaluate`](crate::ast::Expression::evaluate).
#[derive(Debug, Clone)]
pub enum Expression {
    /// A literal value, or `now`.
    Constant(Constant),

    /// A value read from the document, or from the predicate candidate via `@`.
    Selection(StateSelection),

    /// `#`: the key of the predicate candidate.
    KeyReference,

    /// `not expr`
    Negation(Box<Expression>),

    /// `exists /path`
    Existence(StateSelection),

    /// `/path is int`, `/path is not null`
    TypeCheck(TypeCheck),

    /// `+ - * / % ^` over numbers.
    Arithmetic(Binary<ArithmeticOperator>),

    /// `== != > < >= <=`
    Relational(Binary<RelationalOperator>),

    /// `and or xor nor`
    Logical(Binary<LogicalOperator>),

    /// `+ -` over timestamps and durations.
    TimestampArithmetic(Binary<TemporalOperator>),

    /// `in`, `not in`, `between`, `not between`
    ParametrizedRelational(Parametrized),

    /// `matches`, `starts with`, `ends with`, `contains`
    StringMatching(StringMatching),

    /// `concat(a, b, ...)`
    Concatenation(Vec<Expression>),

    /// `expr has annotation "name"`
    HasAnnotation {
        subject: Box<Expression>,
        annotation: Box<Expression>,
    },
}

#[derive(Debug, Clone)]
pub enum Constant {
    Value(Value),
    /// The current time, read at each evaluation.
    Now,
}

/// Where a selection starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Document,
    Current,
}

#[derive(Debug, Clone)]
pub struct StateSelection {
    pub origin: Origin,
    /// `None` only for a bare `@`.
    pub path: Option<PathSegment>,
    pub expected: ExpressionKind,
}

#[derive(Debug, Clone)]
pub struct TypeCheck {
    pub selection: StateSelection,
    pub test: KindTest,
    pub negated: bool,
}

#[derive(Debug, Clone)]
pub struct Binary<Op> {
    pub operator: Op,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone)]
pub struct Parametrized {
    pub operator: ParametrizedOperator,
    pub subject: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct StringMatching {
    pub operator: MatchOperator,
    pub subject: Box<Expression>,
    pub argument: Box<Expression>,
    /// Precompiled regex when the argument is a constant.
    pub(crate) compiled: Option<Regex>,
    pub(crate) cache: Arc<RegexCache>,
}

impl Expression {
    pub fn kind(&self) -> ExpressionKind {
        match self {
            Expression::Constant(Constant::Value(value)) => ExpressionKind::of_value(value),
            Expression::Constant(Constant::Now) => ExpressionKind::Timestamp,
            Expression::Selection(selection) => selection.expected,
            Expression::KeyReference => ExpressionKind::Any,
            Expression::Arithmetic(binary) => binary.kind,
            Expression::TimestampArithmetic(binary) => binary.kind,
            Expression::Concatenation(_) => ExpressionKind::String,
            Expression::Negation(_)
            | Expression::Existence(_)
            | Expression::TypeCheck(_)
            | Expression::Relational(_)
            | Expression::Logical(_)
            | Expression::ParametrizedRelational(_)
            | Expression::StringMatching(_)
            | Expression::HasAnnotation { .. } => ExpressionKind::Bool,
        }
    }

    /// Combine two operands the way the precedence grouper asks for.
    pub fn binary(
        left: Expression,
        right: Expression,
        operator: BinaryOperator,
    ) -> Result<Expression, ParseError> {
        match operator.class() {
            OperatorClass::Arithmetic(op) => Expression::arithmetic(op, left, right),
            OperatorClass::Relational(op) => Expression::relational(op, left, right),
            OperatorClass::Logical(op) => Expression::logical(op, left, right),
        }
    }

    /// Arithmetic, or timestamp arithmetic when `+`/`-` meets a temporal operand.
    pub fn arithmetic(
        operator: ArithmeticOperator,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, ParseError> {
        let (lk, rk) = (left.kind(), right.kind());
        let temporal = match operator {
            ArithmeticOperator::Add => Some(TemporalOperator::Add),
            ArithmeticOperator::Subtract => Some(TemporalOperator::Subtract),
            _ => None,
        };
        if let Some(temporal) = temporal
            && (lk.is_temporal() || rk.is_temporal())
        {
            return Expression::timestamp_arithmetic(temporal, left, right);
        }
        let kind = lk.arithmetic(rk).ok_or_else(|| {
            mismatch(format!(
                "cannot apply {} to {lk} and {rk}",
                BinaryOperator::from(operator)
            ))
        })?;
        Ok(Expression::Arithmetic(Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            kind,
        }))
    }

    pub fn timestamp_arithmetic(
        operator: TemporalOperator,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, ParseError> {
        use ExpressionKind::{Any, Duration, Timestamp};
        let kind = match (left.kind(), right.kind(), operator) {
            (Timestamp, Duration, _) | (Timestamp, Any, TemporalOperator::Add) => Timestamp,
            (Timestamp, Any, TemporalOperator::Subtract) => Any,
            (Timestamp | Any, Timestamp, TemporalOperator::Subtract) => Duration,
            (Duration, Duration | Any, _) => Duration,
            (Any, Duration, _) => Any,
            (lk, rk, _) => {
                return Err(mismatch(format!(
                    "cannot apply {} to {lk} and {rk}",
                    BinaryOperator::from(operator)
                )));
            }
        };
        Ok(Expression::TimestampArithmetic(Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            kind,
        }))
    }

    pub fn relational(
        operator: RelationalOperator,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, ParseError> {
        let (lk, rk) = (left.kind(), right.kind());
        if !lk.comparable(rk) {
            return Err(mismatch(format!(
                "cannot compare {lk} with {rk} using {}",
                BinaryOperator::from(operator)
            )));
        }
        Ok(Expression::Relational(Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            kind: ExpressionKind::Bool,
        }))
    }

    pub fn logical(
        operator: LogicalOperator,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, ParseError> {
        for side in [&left, &right] {
            expect_kind(side, ExpressionKind::Bool, BinaryOperator::from(operator).symbol())?;
        }
        Ok(Expression::Logical(Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            kind: ExpressionKind::Bool,
        }))
    }

    pub fn negation(operand: Expression) -> Result<Expression, ParseError> {
        expect_kind(&operand, ExpressionKind::Bool, "not")?;
        Ok(Expression::Negation(Box::new(operand)))
    }

    pub fn parametrized(
        operator: ParametrizedOperator,
        subject: Expression,
        arguments: Vec<Expression>,
    ) -> Result<Expression, ParseError> {
        if matches!(
            operator,
            ParametrizedOperator::Between | ParametrizedOperator::NotBetween
        ) && arguments.len() != 2
        {
            return Err(mismatch(format!(
                "{} expects exactly two arguments, found {}",
                operator.keyword(),
                arguments.len()
            )));
        }
        let subject_kind = subject.kind();
        if let Some(odd) = arguments.iter().find(|arg| !subject_kind.comparable(arg.kind())) {
            return Err(mismatch(format!(
                "{} cannot compare {subject_kind} with {}",
                operator.keyword(),
                odd.kind()
            )));
        }
        Ok(Expression::ParametrizedRelational(Parametrized {
            operator,
            subject: Box::new(subject),
            arguments,
        }))
    }

    /// String matching; a constant argument is compiled right away.
    pub fn string_matching(
        operator: MatchOperator,
        subject: Expression,
        argument: Expression,
        cache: Arc<RegexCache>,
    ) -> Result<Expression, ParseError> {
        expect_kind(&subject, ExpressionKind::String, operator.keyword())?;
        expect_kind(&argument, ExpressionKind::String, operator.keyword())?;
        let compiled = match &argument {
            Expression::Constant(Constant::Value(value)) => match value.as_text() {
                Some(text) => Some(cache.get_or_compile(&operator.pattern(text)).map_err(
                    |err| match err {
                        EvalError::InvalidPattern { pattern, message } => ParseError::InvalidLiteral {
                            kind: "pattern",
                            text: pattern,
                            reason: message,
                        },
                        other => mismatch(other.to_string()),
                    },
                )?),
                None => None,
            },
            _ => None,
        };
        Ok(Expression::StringMatching(StringMatching {
            operator,
            subject: Box::new(subject),
            argument: Box::new(argument),
            compiled,
            cache,
        }))
    }

    pub fn concatenation(arguments: Vec<Expression>) -> Result<Expression, ParseError> {
        match arguments.first() {
            Some(first) => expect_kind(first, ExpressionKind::String, "concat")?,
            None => return Err(mismatch("concat needs at least one argument".to_string())),
        }
        Ok(Expression::Concatenation(arguments))
    }

    pub fn has_annotation(subject: Expression, annotation: Expression) -> Result<Expression, ParseError> {
        expect_kind(&annotation, ExpressionKind::String, "has annotation")?;
        Ok(Expression::HasAnnotation {
            subject: Box::new(subject),
            annotation: Box::new(annotation),
        })
    }
}

fn mismatch(message: String) -> ParseError {
    ParseError::TypeMismatch(message)
}

fn expect_kind(operand: &Expression, wanted: ExpressionKind, operator: &str) -> Result<(), ParseError> {
    let kind = operand.kind();
    if kind.accepts(wanted) {
        Ok(())
    } else {
        Err(mismatch(format!("{operator} expects {wanted}, found {kind} in {operand}")))
    }
}

impl StateSelection {
    /// Text of the selected path, as written.
    pub fn path_text(&self) -> String {
        let path = self.path.as_ref().map(ToString::to_string).unwrap_or_default();
        match self.origin {
            Origin::Document => path,
            Origin::Current => format!("@{path}"),
        }
    }
}

impl fmt::Display for StateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_text())?;
        if self.expected != ExpressionKind::Any {
            write!(f, " as {}", self.expected)?;
        }
        Ok(())
    }
}

impl<Op: Copy + Into<BinaryOperator>> fmt::Display for Binary<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator.into(), self.right)
    }
}

fn join(items: &[Expression]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(Constant::Value(value)) => f.write_str(&to_text(value)),
            Expression::Constant(Constant::Now) => f.write_str("now"),
            Expression::Selection(selection) => write!(f, "{selection}"),
            Expression::KeyReference => f.write_str("#"),
            Expression::Negation(inner) => write!(f, "not {inner}"),
            Expression::Existence(selection) => write!(f, "exists {selection}"),
            Expression::TypeCheck(check) => {
                let not = if check.negated { "not " } else { "" };
                write!(f, "{} is {not}{}", check.selection, check.test)
            }
            Expression::Arithmetic(binary) => write!(f, "{binary}"),
            Expression::Relational(binary) => write!(f, "{binary}"),
            Expression::Logical(binary) => write!(f, "{binary}"),
            Expression::TimestampArithmetic(binary) => write!(f, "{binary}"),
            Expression::ParametrizedRelational(p) => write!(
                f,
                "{} {} ({})",
                p.subject,
                p.operator.keyword(),
                join(&p.arguments)
            ),
            Expression::StringMatching(m) => {
                write!(f, "{} {} {}", m.subject, m.operator.keyword(), m.argument)
            }
            Expression::Concatenation(arguments) => write!(f, "concat({})", join(arguments)),
            Expression::HasAnnotation {
                subject,
                annotation,
            } => write!(f, "{subject} has annotation {annotation}"),
        }
    }
}
