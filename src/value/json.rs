//! JSON <-> Value conversion.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::SecondsFormat;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::{Data, Value, literal};

impl Value {
    /// Build a value from parsed JSON.
    ///
    /// Integral numbers become ints, other numbers become floats.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::int(u)
                } else {
                    match n.as_f64() {
                        Some(f) => Value::float(f),
                        None => Value::string(n.to_string()),
                    }
                }
            }
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(arr) => Value::list(arr.into_iter().map(Value::from_json)),
            serde_json::Value::Object(obj) => {
                Value::structure(obj.into_iter().map(|(k, v)| (k, Value::from_json(v))))
            }
        }
    }

    /// JSON form of this value. Annotations are dropped.
    ///
    /// Ints wider than 64 bits, decimals without an exact `f64`
    /// counterpart, timestamps, durations and lobs are written as strings;
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self.data() {
            Data::Null(_) => serde_json::Value::Null,
            Data::Bool(b) => serde_json::Value::Bool(*b),
            Data::Int(i) => {
                if let Some(n) = i.to_i64() {
                    serde_json::Value::Number(n.into())
                } else if let Some(n) = i.to_u64() {
                    serde_json::Value::Number(n.into())
                } else {
                    serde_json::Value::String(i.to_string())
                }
            }
            Data::Float(f) => float(*f),
            Data::Decimal(d) => decimal(d),
            Data::Timestamp(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Data::Duration(d) => serde_json::Value::String(literal::format_duration(d)),
            Data::String(s) | Data::Identifier(s) | Data::QuotedSymbol(s) => {
                serde_json::Value::String(s.clone())
            }
            Data::Blob(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
            Data::Clob(bytes) => {
                serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Data::List(items) | Data::Sexp(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Data::Struct(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn decimal(d: &Decimal) -> serde_json::Value {
    if d.fract().is_zero()
        && let Some(i) = d.to_i64()
    {
        return serde_json::Value::Number(i.into());
    }
    match d.to_f64() {
        Some(f) if Decimal::from_f64(f) == Some(d.normalize()) => float(f),
        _ => serde_json::Value::String(d.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_map_to_ints_and_floats() {
        assert_eq!(Value::from_json(json!(3)), Value::int(3));
        assert_eq!(Value::from_json(json!(u64::MAX)), Value::int(u64::MAX));
        assert_eq!(Value::from_json(json!(2.5)), Value::float(2.5));
        assert_eq!(
            Value::from_json(json!({"a": [null, true]})),
            Value::structure([("a", Value::list([Value::null(), Value::bool(true)]))])
        );
    }

    #[test]
    fn json_objects_keep_every_field() {
        let value = Value::from_json(json!({"b": 1, "a": 2}));
        let names: Vec<_> = value.fields().unwrap().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a") && names.contains(&"b"));
    }

    #[test]
    fn rich_kinds_become_strings_or_numbers() {
        assert_eq!(Value::decimal(Decimal::new(150, 2)).to_json(), json!(1.5));
        assert_eq!(Value::decimal(Decimal::new(7, 0)).to_json(), json!(7));
        assert_eq!(
            Value::duration(chrono::TimeDelta::minutes(90)).to_json(),
            json!("PT1H30M")
        );
        assert_eq!(Value::blob(b"hi".to_vec()).to_json(), json!("aGk="));
        assert_eq!(Value::float(f64::NAN).to_json(), json!(null));
        assert_eq!(
            Value::identifier("open").with_annotations(["tag"]).to_json(),
            json!("open")
        );
    }

    #[test]
    fn wide_ints_are_written_as_strings() {
        let wide = crate::value::parse_value("123456789012345678901234567890").unwrap();
        assert_eq!(wide.to_json(), json!("123456789012345678901234567890"));
        assert_eq!(Value::int(-5).to_json(), json!(-5));
    }
}
