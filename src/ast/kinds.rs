use std::fmt;

use crate::value::{Kind, Value, common_kind};

/// Static result kind of an expression, known after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Any,
    Bool,
    Int,
    Float,
    Decimal,
    /// Some numeric kind, decided at evaluation time.
    Number,
    Timestamp,
    Duration,
    String,
}

impl ExpressionKind {
    /// Name accepted after `as` in a selection.
    pub fn from_name(name: &str) -> Option<ExpressionKind> {
        Some(match name {
            "any" => ExpressionKind::Any,
            "bool" => ExpressionKind::Bool,
            "int" => ExpressionKind::Int,
            "float" => ExpressionKind::Float,
            "decimal" => ExpressionKind::Decimal,
            "number" => ExpressionKind::Number,
            "timestamp" => ExpressionKind::Timestamp,
            "duration" => ExpressionKind::Duration,
            "string" => ExpressionKind::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ExpressionKind::Any => "any",
            ExpressionKind::Bool => "bool",
            ExpressionKind::Int => "int",
            ExpressionKind::Float => "float",
            ExpressionKind::Decimal => "decimal",
            ExpressionKind::Number => "number",
            ExpressionKind::Timestamp => "timestamp",
            ExpressionKind::Duration => "duration",
            ExpressionKind::String => "string",
        }
    }

    pub fn of_value(value: &Value) -> ExpressionKind {
        match value.kind() {
            Kind::Bool => ExpressionKind::Bool,
            Kind::Int => ExpressionKind::Int,
            Kind::Float => ExpressionKind::Float,
            Kind::Decimal => ExpressionKind::Decimal,
            Kind::Timestamp => ExpressionKind::Timestamp,
            Kind::Duration => ExpressionKind::Duration,
            Kind::String | Kind::Identifier | Kind::QuotedSymbol => ExpressionKind::String,
            _ => ExpressionKind::Any,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ExpressionKind::Int
                | ExpressionKind::Float
                | ExpressionKind::Decimal
                | ExpressionKind::Number
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ExpressionKind::Timestamp | ExpressionKind::Duration)
    }

    /// Could a value of this kind also be of kind `wanted`?
    pub fn accepts(self, wanted: ExpressionKind) -> bool {
        self == ExpressionKind::Any
            || self == wanted
            || (wanted == ExpressionKind::Number && self.is_numeric())
            || (self == ExpressionKind::Number && wanted.is_numeric())
    }

    /// Result kind of arithmetic between two numeric kinds.
    pub fn arithmetic(self, other: ExpressionKind) -> Option<ExpressionKind> {
        let concrete = |kind: ExpressionKind| match kind {
            ExpressionKind::Int => Some(Kind::Int),
            ExpressionKind::Float => Some(Kind::Float),
            ExpressionKind::Decimal => Some(Kind::Decimal),
            _ => None,
        };
        let numeric_or_any = |kind: ExpressionKind| kind.is_numeric() || kind == ExpressionKind::Any;
        if !numeric_or_any(self) || !numeric_or_any(other) {
            return None;
        }
        Some(match (concrete(self), concrete(other)) {
            (Some(a), Some(b)) => match common_kind(a, b) {
                Kind::Int => ExpressionKind::Int,
                Kind::Float => ExpressionKind::Float,
                _ => ExpressionKind::Decimal,
            },
            _ => ExpressionKind::Number,
        })
    }

    /// Can values of these kinds be ordered against each other?
    pub fn comparable(self, other: ExpressionKind) -> bool {
        self == ExpressionKind::Any
            || other == ExpressionKind::Any
            || (self.is_numeric() && other.is_numeric())
            || self == other
    }

    /// Does a runtime value conform to this kind? Nulls conform to every kind.
    pub fn admits(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        let kind = value.kind();
        match self {
            ExpressionKind::Any => true,
            ExpressionKind::Bool => kind == Kind::Bool,
            ExpressionKind::Int => kind == Kind::Int,
            ExpressionKind::Float => kind == Kind::Float,
            ExpressionKind::Decimal => kind == Kind::Decimal,
            ExpressionKind::Number => kind.is_numeric(),
            ExpressionKind::Timestamp => kind == Kind::Timestamp,
            ExpressionKind::Duration => kind == Kind::Duration,
            ExpressionKind::String => kind.is_text(),
        }
    }

    /// Kind given to nulls produced by an expression of this kind.
    pub fn null_kind(self) -> Kind {
        match self {
            ExpressionKind::Any => Kind::Null,
            ExpressionKind::Bool => Kind::Bool,
            ExpressionKind::Int => Kind::Int,
            ExpressionKind::Float => Kind::Float,
            ExpressionKind::Decimal | ExpressionKind::Number => Kind::Decimal,
            ExpressionKind::Timestamp => Kind::Timestamp,
            ExpressionKind::Duration => Kind::Duration,
            ExpressionKind::String => Kind::String,
        }
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Right-hand side of an `is` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTest {
    Exactly(Kind),
    Number,
    Text,
}

impl KindTest {
    pub fn from_name(name: &str) -> Option<KindTest> {
        match name {
            "number" => Some(KindTest::Number),
            "text" => Some(KindTest::Text),
            other => Kind::from_name(other).map(KindTest::Exactly),
        }
    }

    /// Typed nulls pass the test for their own kind; untyped nulls only pass `null`.
    pub fn passes(self, value: &Value) -> bool {
        match self {
            KindTest::Exactly(kind) => value.kind() == kind,
            KindTest::Number => value.kind().is_numeric(),
            KindTest::Text => value.kind().is_text(),
        }
    }
}

impl fmt::Display for KindTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindTest::Exactly(kind) => write!(f, "{kind}"),
            KindTest::Number => f.write_str("number"),
            KindTest::Text => f.write_str("text"),
        }
    }
}
