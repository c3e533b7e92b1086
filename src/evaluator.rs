use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use rust_decimal::{Decimal, MathematicalOps};

use crate::{
    ast::{
        ArithmeticOperator, Binary, Constant, Expression, ExpressionKind, LogicalOperator,
        Origin, Parametrized, ParametrizedOperator, RelationalOperator, StateSelection,
        StringMatching, TemporalOperator, TypeCheck,
    },
    error::EvalError,
    path::{Key, MatchType},
    value::{Data, Kind, Numeric, NumericPair, Value, literal},
};

/// What an expression is evaluated against.
///
/// The document is what absolute paths (`/a/b`) read. Inside a query
/// predicate there is also a current candidate: `@` reads it and `#` is its
/// key.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    document: &'a Value,
    current: Option<(Key<'a>, &'a Value)>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(document: &'a Value) -> Self {
        EvaluationContext {
            document,
            current: None,
        }
    }

    /// The same document with `value`, found under `key`, as the candidate.
    pub fn with_current(self, key: Key<'a>, value: &'a Value) -> Self {
        EvaluationContext {
            document: self.document,
            current: Some((key, value)),
        }
    }

    pub fn document(&self) -> &'a Value {
        self.document
    }

    pub fn current(&self) -> Option<(Key<'a>, &'a Value)> {
        self.current
    }
}

impl Expression {
    /// Evaluate against `context`, producing a single value.
    ///
    /// Evaluation has no side effects: the same expression may be evaluated
    /// any number of times, from any number of threads.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Value, EvalError> {
        Evaluator { context: *context }.eval(self)
    }
}

struct Evaluator<'a> {
    context: EvaluationContext<'a>,
}

fn type_name(value: &Value) -> String {
    if value.is_null() {
        format!("null {}", value.kind())
    } else {
        value.kind().to_string()
    }
}

fn null_bool() -> Value {
    Value::typed_null(Kind::Bool)
}

impl Evaluator<'_> {
    fn eval(&self, expression: &Expression) -> Result<Value, EvalError> {
        match expression {
            Expression::Constant(Constant::Value(value)) => Ok(value.clone()),
            Expression::Constant(Constant::Now) => Ok(Value::timestamp(literal::now())),
            Expression::Selection(selection) => self.select(selection),
            Expression::KeyReference => match self.context.current() {
                Some((Key::Property(name), _)) => Ok(Value::string(name)),
                Some((Key::Item(index), _)) => Ok(Value::int(index)),
                None => Err(EvalError::NoCurrentNode("#")),
            },
            Expression::Negation(inner) => {
                let value = self.eval(inner)?;
                match value.data() {
                    Data::Bool(b) => Ok(Value::bool(!b)),
                    Data::Null(_) => Ok(null_bool()),
                    _ => Err(EvalError::TypeMismatch(format!(
                        "not expects bool, found {}",
                        type_name(&value)
                    ))),
                }
            }
            Expression::Existence(selection) => match self.select(selection) {
                Ok(_) => Ok(Value::bool(self.reaches(selection)?)),
                Err(err) if err.is_selection_failure() => Ok(Value::bool(false)),
                Err(err) => Err(err),
            },
            Expression::TypeCheck(check) => self.type_check(check),
            Expression::Arithmetic(binary) => {
                let left = self.eval(&binary.left)?;
                let right = self.eval(&binary.right)?;
                arithmetic(binary, &left, &right)
            }
            Expression::Relational(binary) => {
                let left = self.eval(&binary.left)?;
                let right = self.eval(&binary.right)?;
                relate(binary.operator, &left, &right)
            }
            Expression::Logical(binary) => self.logical(binary),
            Expression::TimestampArithmetic(binary) => {
                let left = self.eval(&binary.left)?;
                let right = self.eval(&binary.right)?;
                temporal(binary, &left, &right)
            }
            Expression::ParametrizedRelational(parametrized) => self.parametrized(parametrized),
            Expression::StringMatching(matching) => self.string_matching(matching),
            Expression::Concatenation(arguments) => self.concatenate(arguments),
            Expression::HasAnnotation {
                subject,
                annotation,
            } => {
                let subject = self.eval(subject)?;
                let annotation = self.eval(annotation)?;
                match annotation.as_text() {
                    Some(name) => Ok(Value::bool(subject.has_annotation(name))),
                    None if annotation.is_null() => Ok(null_bool()),
                    None => Err(EvalError::TypeMismatch(format!(
                        "has annotation expects text, found {}",
                        type_name(&annotation)
                    ))),
                }
            }
        }
    }

    fn root(&self, selection: &StateSelection) -> Result<&Value, EvalError> {
        match selection.origin {
            Origin::Document => Ok(self.context.document()),
            Origin::Current => self
                .context
                .current()
                .map(|(_, value)| value)
                .ok_or(EvalError::NoCurrentNode("@")),
        }
    }

    /// Read a selection, enforcing its expected kind.
    ///
    /// An optional step that finds nothing yields a null of the expected
    /// kind; a required one fails with a selection miss.
    fn select(&self, selection: &StateSelection) -> Result<Value, EvalError> {
        let root = self.root(selection)?;
        let found = match &selection.path {
            None => Some(root),
            Some(path) => {
                let resolved = path.select(root)?;
                match resolved.match_type {
                    MatchType::Hit => resolved.value,
                    MatchType::Fallback => None,
                    MatchType::Miss => {
                        return Err(EvalError::SelectionMiss {
                            path: selection.path_text(),
                        });
                    }
                }
            }
        };
        let expected = selection.expected;
        match found {
            None => Ok(Value::typed_null(expected.null_kind())),
            Some(value) if !expected.admits(value) => Err(EvalError::MismatchedSelectionType {
                path: selection.path_text(),
                expected: expected.to_string(),
                found: value.kind(),
            }),
            Some(value) if value.kind() == Kind::Null && expected != ExpressionKind::Any => {
                Ok(Value::typed_null(expected.null_kind()).with_annotations(value.annotations().to_vec()))
            }
            Some(value) => Ok(value.clone()),
        }
    }

    /// Whether a selection that evaluated cleanly actually found a value.
    fn reaches(&self, selection: &StateSelection) -> Result<bool, EvalError> {
        let root = self.root(selection)?;
        Ok(match &selection.path {
            None => true,
            Some(path) => path.select(root)?.match_type == MatchType::Hit,
        })
    }

    fn type_check(&self, check: &TypeCheck) -> Result<Value, EvalError> {
        let passes = match self.select(&check.selection) {
            Ok(value) => self.reaches(&check.selection)? && check.test.passes(&value),
            Err(err) if err.is_selection_failure() => false,
            Err(err) => return Err(err),
        };
        Ok(Value::bool(passes != check.negated))
    }

    fn logical(&self, binary: &Binary<LogicalOperator>) -> Result<Value, EvalError> {
        let left = self.eval(&binary.left)?;
        let right = self.eval(&binary.right)?;
        let operand = |value: &Value| match value.data() {
            Data::Bool(b) => Ok(Some(*b)),
            Data::Null(_) => Ok(None),
            _ => Err(EvalError::TypeMismatch(format!(
                "logical operators expect bool, found {}",
                type_name(value)
            ))),
        };
        let (Some(a), Some(b)) = (operand(&left)?, operand(&right)?) else {
            return Ok(null_bool());
        };
        Ok(Value::bool(match binary.operator {
            LogicalOperator::And => a && b,
            LogicalOperator::Or => a || b,
            LogicalOperator::Xor => a != b,
            LogicalOperator::Nor => !(a || b),
        }))
    }

    fn parametrized(&self, parametrized: &Parametrized) -> Result<Value, EvalError> {
        let subject = self.eval(&parametrized.subject)?;
        let arguments = parametrized
            .arguments
            .iter()
            .map(|argument| self.eval(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let outcome = match parametrized.operator {
            ParametrizedOperator::In | ParametrizedOperator::NotIn => membership(&subject, &arguments)?,
            ParametrizedOperator::Between | ParametrizedOperator::NotBetween => {
                let [lower, upper] = arguments.as_slice() else {
                    return Err(EvalError::TypeMismatch(format!(
                        "between expects two bounds, found {}",
                        arguments.len()
                    )));
                };
                let above = relate(RelationalOperator::GreaterOrEqual, &subject, lower)?;
                let below = relate(RelationalOperator::LessOrEqual, &subject, upper)?;
                match (above.as_bool(), below.as_bool()) {
                    (Some(a), Some(b)) => Some(a && b),
                    _ => None,
                }
            }
        };
        let negated = matches!(
            parametrized.operator,
            ParametrizedOperator::NotIn | ParametrizedOperator::NotBetween
        );
        Ok(match outcome {
            Some(result) => Value::bool(result != negated),
            None => null_bool(),
        })
    }

    fn string_matching(&self, matching: &StringMatching) -> Result<Value, EvalError> {
        let subject = self.eval(&matching.subject)?;
        let argument = self.eval(&matching.argument)?;
        if subject.is_null() || argument.is_null() {
            return Ok(null_bool());
        }
        let (Some(text), Some(pattern)) = (subject.as_text(), argument.as_text()) else {
            return Err(EvalError::TypeMismatch(format!(
                "{} expects text operands, found {} and {}",
                matching.operator.keyword(),
                type_name(&subject),
                type_name(&argument)
            )));
        };
        let regex = match &matching.compiled {
            Some(regex) => regex.clone(),
            None => matching
                .cache
                .get_or_compile(&matching.operator.pattern(pattern))?,
        };
        Ok(Value::bool(regex.is_match(text)))
    }

    fn concatenate(&self, arguments: &[Expression]) -> Result<Value, EvalError> {
        let mut out = String::new();
        for (position, argument) in arguments.iter().enumerate() {
            let value = self.eval(argument)?;
            if position == 0 {
                match value.as_text() {
                    Some(text) => out.push_str(text),
                    None if value.is_null() => return Ok(Value::typed_null(Kind::String)),
                    None => {
                        return Err(EvalError::TypeMismatch(format!(
                            "concat expects text first, found {}",
                            type_name(&value)
                        )));
                    }
                }
            } else {
                out.push_str(&value.canonical_text());
            }
        }
        Ok(Value::string(out))
    }
}

/// `Some(found)` or `None` when a null leaves the answer unknown.
fn membership(subject: &Value, arguments: &[Value]) -> Result<Option<bool>, EvalError> {
    if subject.is_null() {
        return Ok(None);
    }
    let mut saw_null = false;
    for argument in arguments {
        if argument.is_null() {
            saw_null = true;
        } else if subject.compare(argument)? == Ordering::Equal {
            return Ok(Some(true));
        }
    }
    Ok(if saw_null { None } else { Some(false) })
}

fn relate(operator: RelationalOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(null_bool());
    }
    Ok(Value::bool(operator.holds(left.compare(right)?)))
}

/// Kind of the null produced when an arithmetic operand is null.
fn null_arithmetic_kind(kind: ExpressionKind, left: &Value, right: &Value) -> Kind {
    match kind {
        ExpressionKind::Int => Kind::Int,
        ExpressionKind::Float => Kind::Float,
        ExpressionKind::Decimal => Kind::Decimal,
        _ => match (left.kind(), right.kind()) {
            (a, b) if a.is_numeric() && b.is_numeric() => crate::value::common_kind(a, b),
            _ => Kind::Decimal,
        },
    }
}

fn arithmetic(
    binary: &Binary<ArithmeticOperator>,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::typed_null(null_arithmetic_kind(binary.kind, left, right)));
    }
    let (Some(a), Some(b)) = (Numeric::of(left), Numeric::of(right)) else {
        return Err(EvalError::TypeMismatch(format!(
            "cannot apply {} to {} and {}",
            crate::ast::BinaryOperator::from(binary.operator),
            type_name(left),
            type_name(right)
        )));
    };
    match a.coerce(b) {
        NumericPair::Int(a, b) => int_arithmetic(binary.operator, a, b).map(Value::int),
        NumericPair::Float(a, b) => float_arithmetic(binary.operator, a, b).map(Value::float),
        NumericPair::Decimal(a, b) => {
            decimal_arithmetic(binary.operator, a, b).map(Value::decimal)
        }
    }
}

/// Largest result, in bits, an integer power may produce.
const MAX_POWER_BITS: u64 = 1 << 20;

fn int_arithmetic(
    operator: ArithmeticOperator,
    a: BigInt,
    b: BigInt,
) -> Result<BigInt, EvalError> {
    match operator {
        ArithmeticOperator::Add => Ok(a + b),
        ArithmeticOperator::Subtract => Ok(a - b),
        ArithmeticOperator::Multiply => Ok(a * b),
        ArithmeticOperator::Divide | ArithmeticOperator::Modulus if b.is_zero() => {
            Err(EvalError::DivisionByZero)
        }
        ArithmeticOperator::Divide => Ok(a / b),
        ArithmeticOperator::Modulus => Ok(a % b),
        ArithmeticOperator::Power if b.is_negative() => {
            // Negative exponents truncate toward zero like integer division.
            if a.is_zero() {
                Err(EvalError::DivisionByZero)
            } else if a.is_one() {
                Ok(a)
            } else if a == -BigInt::one() {
                Ok(if (&b % 2u32).is_zero() { BigInt::one() } else { a })
            } else {
                Ok(BigInt::zero())
            }
        }
        ArithmeticOperator::Power => {
            if a.is_zero() || a.is_one() {
                return Ok(if b.is_zero() { BigInt::one() } else { a });
            }
            if a == -BigInt::one() {
                return Ok(if (&b % 2u32).is_zero() { BigInt::one() } else { a });
            }
            let exponent = b
                .to_u32()
                .filter(|e| a.bits().saturating_mul(u64::from(*e)) <= MAX_POWER_BITS);
            match exponent {
                Some(exponent) => Ok(a.pow(exponent)),
                None => Err(EvalError::Overflow(format!("{a} ^ {b}"))),
            }
        }
    }
}

/// Float results are computed exactly in decimal when both operands allow it.
fn float_arithmetic(operator: ArithmeticOperator, a: f64, b: f64) -> Result<f64, EvalError> {
    if matches!(operator, ArithmeticOperator::Divide | ArithmeticOperator::Modulus) && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if operator != ArithmeticOperator::Power
        && let (Some(da), Some(db)) = (Decimal::from_f64(a), Decimal::from_f64(b))
        && let Ok(exact) = decimal_arithmetic(operator, da, db)
        && let Some(result) = exact.to_f64()
    {
        return Ok(result);
    }
    Ok(match operator {
        ArithmeticOperator::Add => a + b,
        ArithmeticOperator::Subtract => a - b,
        ArithmeticOperator::Multiply => a * b,
        ArithmeticOperator::Divide => a / b,
        ArithmeticOperator::Modulus => a % b,
        ArithmeticOperator::Power => a.powf(b),
    })
}

fn decimal_arithmetic(
    operator: ArithmeticOperator,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, EvalError> {
    let overflow = || EvalError::Overflow(format!("{a} {} {b}", crate::ast::BinaryOperator::from(operator)));
    match operator {
        ArithmeticOperator::Add => a.checked_add(b).ok_or_else(overflow),
        ArithmeticOperator::Subtract => a.checked_sub(b).ok_or_else(overflow),
        ArithmeticOperator::Multiply => a.checked_mul(b).ok_or_else(overflow),
        ArithmeticOperator::Divide | ArithmeticOperator::Modulus if b.is_zero() => {
            Err(EvalError::DivisionByZero)
        }
        ArithmeticOperator::Divide => a.checked_div(b).ok_or_else(overflow),
        ArithmeticOperator::Modulus => a.checked_rem(b).ok_or_else(overflow),
        ArithmeticOperator::Power => {
            if a.is_zero() && b.is_sign_negative() {
                return Err(EvalError::DivisionByZero);
            }
            match b.to_i64() {
                Some(exponent) if b.fract().is_zero() => a.checked_powi(exponent),
                _ => a.checked_powd(b),
            }
            .ok_or_else(overflow)
        }
    }
}

fn temporal(
    binary: &Binary<TemporalOperator>,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        let kind = match binary.kind {
            ExpressionKind::Duration => Kind::Duration,
            ExpressionKind::Timestamp => Kind::Timestamp,
            _ => match (left.kind(), right.kind()) {
                (Kind::Timestamp, Kind::Timestamp) => Kind::Duration,
                (Kind::Duration, Kind::Duration) => Kind::Duration,
                _ => Kind::Timestamp,
            },
        };
        return Ok(Value::typed_null(kind));
    }
    let overflow = || EvalError::Overflow(format!("{} {}", type_name(left), type_name(right)));
    match (left.data(), right.data(), binary.operator) {
        (Data::Timestamp(t), Data::Duration(d), TemporalOperator::Add) => {
            t.checked_add_signed(*d).map(Value::timestamp).ok_or_else(overflow)
        }
        (Data::Timestamp(t), Data::Duration(d), TemporalOperator::Subtract) => {
            t.checked_sub_signed(*d).map(Value::timestamp).ok_or_else(overflow)
        }
        (Data::Timestamp(a), Data::Timestamp(b), TemporalOperator::Subtract) => {
            Ok(Value::duration(a.signed_duration_since(*b)))
        }
        (Data::Duration(a), Data::Duration(b), TemporalOperator::Add) => {
            a.checked_add(b).map(Value::duration).ok_or_else(overflow)
        }
        (Data::Duration(a), Data::Duration(b), TemporalOperator::Subtract) => {
            a.checked_sub(b).map(Value::duration).ok_or_else(overflow)
        }
        _ => Err(EvalError::TypeMismatch(format!(
            "cannot apply {} to {} and {}",
            crate::ast::BinaryOperator::from(binary.operator),
            type_name(left),
            type_name(right)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_op(operator: ArithmeticOperator, a: i64, b: i64) -> Result<BigInt, EvalError> {
        int_arithmetic(operator, BigInt::from(a), BigInt::from(b))
    }

    fn big(text: &str) -> BigInt {
        text.parse().unwrap()
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(int_op(ArithmeticOperator::Divide, 7, 2), Ok(BigInt::from(3)));
        assert_eq!(int_op(ArithmeticOperator::Divide, -7, 2), Ok(BigInt::from(-3)));
        assert_eq!(int_op(ArithmeticOperator::Modulus, -7, 2), Ok(BigInt::from(-1)));
        assert_eq!(int_op(ArithmeticOperator::Modulus, 7, 0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn negative_integer_powers_truncate() {
        assert_eq!(int_op(ArithmeticOperator::Power, 2, -1), Ok(BigInt::zero()));
        assert_eq!(int_op(ArithmeticOperator::Power, -1, -3), Ok(BigInt::from(-1)));
        assert_eq!(int_op(ArithmeticOperator::Power, -1, -4), Ok(BigInt::one()));
        assert_eq!(int_op(ArithmeticOperator::Power, 0, -1), Err(EvalError::DivisionByZero));
        assert_eq!(int_op(ArithmeticOperator::Power, 2, 10), Ok(BigInt::from(1024)));
    }

    #[test]
    fn integers_grow_past_64_bits() {
        assert_eq!(
            int_op(ArithmeticOperator::Multiply, i64::MAX, 2),
            Ok(big("18446744073709551614"))
        );
        assert_eq!(
            int_op(ArithmeticOperator::Power, 10, 30),
            Ok(big("1000000000000000000000000000000"))
        );
        assert_eq!(int_op(ArithmeticOperator::Power, -1, i64::MAX), Ok(BigInt::from(-1)));
    }

    #[test]
    fn runaway_integer_powers_are_reported() {
        assert!(matches!(
            int_op(ArithmeticOperator::Power, 2, i64::MAX),
            Err(EvalError::Overflow(_))
        ));
    }

    #[test]
    fn float_sums_are_exact_where_possible() {
        assert_eq!(float_arithmetic(ArithmeticOperator::Add, 0.1, 0.2), Ok(0.3));
    }

    #[test]
    fn decimal_powers() {
        let two = Decimal::from(2);
        assert_eq!(
            decimal_arithmetic(ArithmeticOperator::Power, two, Decimal::from(3)),
            Ok(Decimal::from(8))
        );
        assert_eq!(
            decimal_arithmetic(ArithmeticOperator::Power, two, Decimal::from(-1)),
            Ok(Decimal::new(5, 1))
        );
    }

    #[test]
    fn membership_propagates_unknowns() {
        let one = Value::int(1);
        assert_eq!(membership(&one, &[Value::int(2), Value::int(1)]), Ok(Some(true)));
        assert_eq!(membership(&one, &[Value::int(2), Value::null()]), Ok(None));
        assert_eq!(membership(&one, &[Value::int(2)]), Ok(Some(false)));
        assert_eq!(membership(&Value::null(), &[Value::int(1)]), Ok(None));
    }
}
