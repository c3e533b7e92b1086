mod compare;
mod json;
mod kind;
pub(crate) mod literal;
mod reader;

use chrono::{DateTime, FixedOffset, TimeDelta};
use num_bigint::BigInt;
use rust_decimal::Decimal;

pub use compare::{Numeric, NumericPair, common_kind};
pub use kind::Kind;
pub use reader::parse_value;

pub type Timestamp = DateTime<FixedOffset>;

/// A semi-structured value: the documents expressions query and data trees prune.
///
/// Every value carries an ordered list of annotation strings next to its
/// data. Nulls are typed: `null.int` is a null that still reports
/// [`Kind::Int`], while a plain `null` reports [`Kind::Null`].
///
/// Struct fields keep their insertion order and may repeat a name; lookups
/// return the first match.
///
/// # Examples
///
/// ```
/// use trellis::{Kind, Value};
///
/// let person = Value::structure([
///     ("name", Value::string("Ada")),
///     ("age", Value::int(36)),
/// ]);
/// assert_eq!(person.get("age"), Some(&Value::int(36)));
///
/// let missing = Value::typed_null(Kind::Int);
/// assert!(missing.is_null());
/// assert_eq!(missing.kind(), Kind::Int);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    annotations: Vec<String>,
    data: Data,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// A null of the given kind; [`Kind::Null`] means untyped.
    Null(Kind),
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    Duration(TimeDelta),
    String(String),
    Identifier(String),
    QuotedSymbol(String),
    Blob(Vec<u8>),
    Clob(Vec<u8>),
    List(Vec<Value>),
    Sexp(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Value {
            annotations: Vec::new(),
            data,
        }
    }
}

impl Value {
    pub fn new(data: Data) -> Self {
        Value::from(data)
    }

    pub fn null() -> Self {
        Value::from(Data::Null(Kind::Null))
    }

    pub fn typed_null(kind: Kind) -> Self {
        Value::from(Data::Null(kind))
    }

    pub fn bool(value: bool) -> Self {
        Value::from(Data::Bool(value))
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        Value::from(Data::Int(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Value::from(Data::Float(value))
    }

    pub fn decimal(value: Decimal) -> Self {
        Value::from(Data::Decimal(value))
    }

    pub fn timestamp(value: Timestamp) -> Self {
        Value::from(Data::Timestamp(value))
    }

    pub fn duration(value: TimeDelta) -> Self {
        Value::from(Data::Duration(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::from(Data::String(value.into()))
    }

    pub fn identifier(value: impl Into<String>) -> Self {
        Value::from(Data::Identifier(value.into()))
    }

    pub fn quoted_symbol(value: impl Into<String>) -> Self {
        Value::from(Data::QuotedSymbol(value.into()))
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Value::from(Data::Blob(bytes.into()))
    }

    pub fn clob(bytes: impl Into<Vec<u8>>) -> Self {
        Value::from(Data::Clob(bytes.into()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Data::List(items.into_iter().collect()))
    }

    pub fn sexp(items: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Data::Sexp(items.into_iter().collect()))
    }

    pub fn structure<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::from(Data::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        ))
    }

    /// Replace the annotation list.
    pub fn with_annotations<S: Into<String>>(
        mut self,
        annotations: impl IntoIterator<Item = S>,
    ) -> Self {
        self.annotations = annotations.into_iter().map(Into::into).collect();
        self
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }

    /// Append one annotation, keeping the existing ones.
    pub fn annotate(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Number of children of a container; `0` for scalars and nulls.
    pub fn len(&self) -> usize {
        match &self.data {
            Data::List(items) | Data::Sexp(items) => items.len(),
            Data::Struct(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child values of a container in document order, with struct field
    /// names dropped.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.data {
            Data::List(items) | Data::Sexp(items) => Box::new(items.iter()),
            Data::Struct(fields) => Box::new(fields.iter().map(|(_, value)| value)),
            _ => Box::new(std::iter::empty()),
        }
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    pub fn kind(&self) -> Kind {
        match &self.data {
            Data::Null(kind) => *kind,
            Data::Bool(_) => Kind::Bool,
            Data::Int(_) => Kind::Int,
            Data::Float(_) => Kind::Float,
            Data::Decimal(_) => Kind::Decimal,
            Data::Timestamp(_) => Kind::Timestamp,
            Data::Duration(_) => Kind::Duration,
            Data::String(_) => Kind::String,
            Data::Identifier(_) => Kind::Identifier,
            Data::QuotedSymbol(_) => Kind::QuotedSymbol,
            Data::Blob(_) => Kind::Blob,
            Data::Clob(_) => Kind::Clob,
            Data::List(_) => Kind::List,
            Data::Sexp(_) => Kind::Sexp,
            Data::Struct(_) => Kind::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Null(_))
    }

    /// First field named `name`, if this is a non-null struct.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields()?
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Item at `index`, if this is a non-null list or sexp.
    pub fn item(&self, index: usize) -> Option<&Value> {
        self.items()?.get(index)
    }

    pub fn fields(&self) -> Option<&[(String, Value)]> {
        match &self.data {
            Data::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Value]> {
        match &self.data {
            Data::List(items) | Data::Sexp(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match &self.data {
            Data::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        Numeric::of(self).map(|n| n.to_float())
    }

    /// Text of a non-null string, identifier or quoted symbol.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            Data::String(s) | Data::Identifier(s) | Data::QuotedSymbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match &self.data {
            Data::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<&TimeDelta> {
        match &self.data {
            Data::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Exact decimal view of a numeric value. Non-finite floats have none.
    pub fn to_decimal(&self) -> Option<Decimal> {
        Numeric::of(self)?.to_decimal()
    }

    /// Text used when a value is spliced into a string: text kinds
    /// contribute their raw characters, everything else its text form.
    pub fn canonical_text(&self) -> String {
        match &self.data {
            Data::String(s) | Data::Identifier(s) | Data::QuotedSymbol(s) => s.clone(),
            Data::Null(_) => "null".to_string(),
            Data::Decimal(d) => d.to_string(),
            _ => crate::output::TextPrinter::bare().print(self),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::output::TextPrinter::compact().print(self))
    }
}
