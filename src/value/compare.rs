//! Numeric coercion and ordering between values.
//!
//! Binary numeric operations first lift both operands to a common
//! representation:
//!
//! | left    | right   | common  |
//! |---------|---------|---------|
//! | int     | int     | int     |
//! | int     | float   | float   |
//! | int     | decimal | decimal |
//! | float   | decimal | decimal |
//!
//! The table is symmetric. When an operand lies outside the decimal range
//! (a float above about 7.9e28, or an int with more than 28 digits) the
//! decimal row falls back to float.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive};
use rust_decimal::Decimal;

use super::{Data, Kind, Value};
use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Int(BigInt),
    Float(f64),
    Decimal(Decimal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumericPair {
    Int(BigInt, BigInt),
    Float(f64, f64),
    Decimal(Decimal, Decimal),
}

impl Numeric {
    pub fn of(value: &Value) -> Option<Numeric> {
        match value.data() {
            Data::Int(n) => Some(Numeric::Int(n.clone())),
            Data::Float(n) => Some(Numeric::Float(*n)),
            Data::Decimal(d) => Some(Numeric::Decimal(*d)),
            _ => None,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Numeric::Int(_) => Kind::Int,
            Numeric::Float(_) => Kind::Float,
            Numeric::Decimal(_) => Kind::Decimal,
        }
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Numeric::Int(n) => n.to_i128().and_then(Decimal::from_i128),
            Numeric::Float(n) => Decimal::from_f64(*n),
            Numeric::Decimal(d) => Some(*d),
        }
    }

    pub fn to_float(&self) -> f64 {
        match self {
            Numeric::Int(n) => n.to_f64().unwrap_or(if n.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Numeric::Float(n) => *n,
            Numeric::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Lift both operands to their common representation.
    pub fn coerce(self, other: Numeric) -> NumericPair {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => NumericPair::Int(a, b),
            (a, b) if common_kind(a.kind(), b.kind()) == Kind::Float => {
                NumericPair::Float(a.to_float(), b.to_float())
            }
            (a, b) => match (a.to_decimal(), b.to_decimal()) {
                (Some(x), Some(y)) => NumericPair::Decimal(x, y),
                _ => {
                    log::trace!("{a:?} or {b:?} exceeds the decimal range, using float");
                    NumericPair::Float(a.to_float(), b.to_float())
                }
            },
        }
    }
}

/// Common kind of two numeric kinds, following the coercion table.
pub fn common_kind(left: Kind, right: Kind) -> Kind {
    match (left, right) {
        (Kind::Int, Kind::Int) => Kind::Int,
        (Kind::Decimal, _) | (_, Kind::Decimal) => Kind::Decimal,
        _ => Kind::Float,
    }
}

impl Value {
    /// Order two non-null values of compatible kinds.
    ///
    /// Numbers compare after coercion, text kinds compare with each other
    /// by code point, and timestamps compare as instants. Anything else,
    /// including nulls and unordered floats, is a type mismatch.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        if let (Some(a), Some(b)) = (Numeric::of(self), Numeric::of(other)) {
            return match a.coerce(b) {
                NumericPair::Int(a, b) => Ok(a.cmp(&b)),
                NumericPair::Decimal(a, b) => Ok(a.cmp(&b)),
                NumericPair::Float(a, b) => a.partial_cmp(&b).ok_or_else(|| {
                    EvalError::TypeMismatch(format!("{a} and {b} are not ordered"))
                }),
            };
        }
        if let (Some(a), Some(b)) = (self.as_text(), other.as_text()) {
            return Ok(a.cmp(b));
        }
        match (self.data(), other.data()) {
            (Data::Bool(a), Data::Bool(b)) => Ok(a.cmp(b)),
            (Data::Timestamp(a), Data::Timestamp(b)) => Ok(a.cmp(b)),
            (Data::Duration(a), Data::Duration(b)) => Ok(a.cmp(b)),
            _ => Err(EvalError::TypeMismatch(format!(
                "cannot compare {} with {}",
                describe(self),
                describe(other)
            ))),
        }
    }
}

fn describe(value: &Value) -> String {
    if value.is_null() {
        format!("null {}", value.kind())
    } else {
        value.kind().to_string()
    }
}
