use std::fmt;

/// The fifteen kinds a [`super::Value`] can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Duration,
    String,
    Identifier,
    QuotedSymbol,
    Blob,
    Clob,
    List,
    Sexp,
    Struct,
}

impl Kind {
    pub const ALL: [Kind; 15] = [
        Kind::Null,
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::Decimal,
        Kind::Timestamp,
        Kind::Duration,
        Kind::String,
        Kind::Identifier,
        Kind::QuotedSymbol,
        Kind::Blob,
        Kind::Clob,
        Kind::List,
        Kind::Sexp,
        Kind::Struct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Decimal => "decimal",
            Kind::Timestamp => "timestamp",
            Kind::Duration => "duration",
            Kind::String => "string",
            Kind::Identifier => "identifier",
            Kind::QuotedSymbol => "quoted_symbol",
            Kind::Blob => "blob",
            Kind::Clob => "clob",
            Kind::List => "list",
            Kind::Sexp => "sexp",
            Kind::Struct => "struct",
        }
    }

    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Float | Kind::Decimal)
    }

    pub fn is_text(self) -> bool {
        matches!(self, Kind::String | Kind::Identifier | Kind::QuotedSymbol)
    }

    pub fn is_sequence(self) -> bool {
        matches!(self, Kind::List | Kind::Sexp)
    }

    pub fn is_container(self) -> bool {
        self.is_sequence() || self == Kind::Struct
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
