use std::fmt;

use crate::grouping::Associativity;

/// Binary operators as they appear between operands in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `^`
    Power,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulus,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    And,
    Xor,
    Nor,
    Or,
}

impl BinaryOperator {
    /// Precedence tiers, tightest first.
    pub const PRECEDENCE: &'static [&'static [BinaryOperator]] = &[
        &[BinaryOperator::Power],
        &[
            BinaryOperator::Multiply,
            BinaryOperator::Divide,
            BinaryOperator::Modulus,
        ],
        &[BinaryOperator::Add, BinaryOperator::Subtract],
        &[
            BinaryOperator::GreaterThan,
            BinaryOperator::LessThan,
            BinaryOperator::GreaterOrEqual,
            BinaryOperator::LessOrEqual,
        ],
        &[BinaryOperator::Equal, BinaryOperator::NotEqual],
        &[BinaryOperator::And],
        &[BinaryOperator::Xor],
        &[BinaryOperator::Nor],
        &[BinaryOperator::Or],
    ];

    pub fn associativity(self) -> Associativity {
        match self {
            BinaryOperator::Power => Associativity::RightToLeft,
            _ => Associativity::LeftToRight,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Power => "^",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulus => "%",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "and",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Nor => "nor",
            BinaryOperator::Or => "or",
        }
    }

    pub fn class(self) -> OperatorClass {
        use BinaryOperator::*;
        match self {
            Power => OperatorClass::Arithmetic(ArithmeticOperator::Power),
            Multiply => OperatorClass::Arithmetic(ArithmeticOperator::Multiply),
            Divide => OperatorClass::Arithmetic(ArithmeticOperator::Divide),
            Modulus => OperatorClass::Arithmetic(ArithmeticOperator::Modulus),
            Add => OperatorClass::Arithmetic(ArithmeticOperator::Add),
            Subtract => OperatorClass::Arithmetic(ArithmeticOperator::Subtract),
            GreaterThan => OperatorClass::Relational(RelationalOperator::GreaterThan),
            LessThan => OperatorClass::Relational(RelationalOperator::LessThan),
            GreaterOrEqual => OperatorClass::Relational(RelationalOperator::GreaterOrEqual),
            LessOrEqual => OperatorClass::Relational(RelationalOperator::LessOrEqual),
            Equal => OperatorClass::Relational(RelationalOperator::Equal),
            NotEqual => OperatorClass::Relational(RelationalOperator::NotEqual),
            And => OperatorClass::Logical(LogicalOperator::And),
            Xor => OperatorClass::Logical(LogicalOperator::Xor),
            Nor => OperatorClass::Logical(LogicalOperator::Nor),
            Or => OperatorClass::Logical(LogicalOperator::Or),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Arithmetic(ArithmeticOperator),
    Relational(RelationalOperator),
    Logical(LogicalOperator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl RelationalOperator {
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            RelationalOperator::Equal => ordering == Equal,
            RelationalOperator::NotEqual => ordering != Equal,
            RelationalOperator::GreaterThan => ordering == Greater,
            RelationalOperator::LessThan => ordering == Less,
            RelationalOperator::GreaterOrEqual => ordering != Less,
            RelationalOperator::LessOrEqual => ordering != Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Xor,
    Nor,
}

/// `+` and `-` between timestamps and durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalOperator {
    Add,
    Subtract,
}

/// Operators that take a parenthesized argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametrizedOperator {
    In,
    NotIn,
    Between,
    NotBetween,
}

impl ParametrizedOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            ParametrizedOperator::In => "in",
            ParametrizedOperator::NotIn => "not in",
            ParametrizedOperator::Between => "between",
            ParametrizedOperator::NotBetween => "not between",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOperator {
    Matches,
    StartsWith,
    EndsWith,
    Contains,
}

impl MatchOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            MatchOperator::Matches => "matches",
            MatchOperator::StartsWith => "starts with",
            MatchOperator::EndsWith => "ends with",
            MatchOperator::Contains => "contains",
        }
    }

    /// The regex that implements this operator for `argument`.
    ///
    /// Only `matches` takes its argument as a pattern; the others match it
    /// literally. None of them is anchored beyond what the operator implies.
    pub fn pattern(self, argument: &str) -> String {
        match self {
            MatchOperator::Matches => argument.to_string(),
            MatchOperator::StartsWith => format!("^{}", regex::escape(argument)),
            MatchOperator::EndsWith => format!("{}$", regex::escape(argument)),
            MatchOperator::Contains => regex::escape(argument),
        }
    }
}

impl From<ArithmeticOperator> for BinaryOperator {
    fn from(op: ArithmeticOperator) -> Self {
        match op {
            ArithmeticOperator::Add => BinaryOperator::Add,
            ArithmeticOperator::Subtract => BinaryOperator::Subtract,
            ArithmeticOperator::Multiply => BinaryOperator::Multiply,
            ArithmeticOperator::Divide => BinaryOperator::Divide,
            ArithmeticOperator::Modulus => BinaryOperator::Modulus,
            ArithmeticOperator::Power => BinaryOperator::Power,
        }
    }
}

impl From<RelationalOperator> for BinaryOperator {
    fn from(op: RelationalOperator) -> Self {
        match op {
            RelationalOperator::Equal => BinaryOperator::Equal,
            RelationalOperator::NotEqual => BinaryOperator::NotEqual,
            RelationalOperator::GreaterThan => BinaryOperator::GreaterThan,
            RelationalOperator::LessThan => BinaryOperator::LessThan,
            RelationalOperator::GreaterOrEqual => BinaryOperator::GreaterOrEqual,
            RelationalOperator::LessOrEqual => BinaryOperator::LessOrEqual,
        }
    }
}

impl From<LogicalOperator> for BinaryOperator {
    fn from(op: LogicalOperator) -> Self {
        match op {
            LogicalOperator::And => BinaryOperator::And,
            LogicalOperator::Or => BinaryOperator::Or,
            LogicalOperator::Xor => BinaryOperator::Xor,
            LogicalOperator::Nor => BinaryOperator::Nor,
        }
    }
}

impl From<TemporalOperator> for BinaryOperator {
    fn from(op: TemporalOperator) -> Self {
        match op {
            TemporalOperator::Add => BinaryOperator::Add,
            TemporalOperator::Subtract => BinaryOperator::Subtract,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operator_has_a_tier() {
        use BinaryOperator::*;
        for op in [
            Power, Multiply, Divide, Modulus, Add, Subtract, GreaterThan, LessThan,
            GreaterOrEqual, LessOrEqual, Equal, NotEqual, And, Xor, Nor, Or,
        ] {
            let tiers = BinaryOperator::PRECEDENCE
                .iter()
                .filter(|tier| tier.contains(&op))
                .count();
            assert_eq!(tiers, 1, "{op} should be in exactly one tier");
        }
    }

    #[test]
    fn literal_match_operators_escape_their_argument() {
        assert_eq!(MatchOperator::StartsWith.pattern("a.b"), r"^a\.b");
        assert_eq!(MatchOperator::EndsWith.pattern("(x)"), r"\(x\)$");
        assert_eq!(MatchOperator::Matches.pattern("a.b"), "a.b");
    }
}
