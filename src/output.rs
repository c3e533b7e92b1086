//! Text serialization for values.
//!
//! The printed form reads back through [`crate::parse_value`]: decimals keep
//! their `d` exponent marker, symbols that are not plain identifiers are
//! quoted, and annotations are written as `name::` prefixes.
//!
//! # Examples
//!
//! ```
//! use trellis::Value;
//! use trellis::output::{to_text, to_text_pretty};
//!
//! let value = Value::list([Value::int(1), Value::string("two")]);
//! assert_eq!(to_text(&value), "[1,\"two\"]");
//! assert_eq!(to_text_pretty(&value), "[\n  1,\n  \"two\"\n]");
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::SecondsFormat;

use crate::value::{Data, Kind, Value, literal};

const RESERVED_SYMBOLS: [&str; 5] = ["null", "true", "false", "nan", "now"];

pub struct TextPrinter {
    pretty: bool,
    annotations: bool,
}

impl TextPrinter {
    pub fn new(pretty: bool) -> Self {
        TextPrinter {
            pretty,
            annotations: true,
        }
    }

    pub fn compact() -> Self {
        TextPrinter::new(false)
    }

    /// Compact output without annotations.
    pub fn bare() -> Self {
        TextPrinter {
            pretty: false,
            annotations: false,
        }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        let mut out = String::new();
        if self.annotations {
            for annotation in value.annotations() {
                out.push_str(&symbol(annotation));
                out.push_str("::");
            }
        }
        let body = match value.data() {
            Data::Null(Kind::Null) => "null".to_string(),
            Data::Null(kind) => format!("null.{kind}"),
            Data::Bool(b) => b.to_string(),
            Data::Int(n) => n.to_string(),
            Data::Float(n) => float(*n),
            Data::Decimal(d) => format!("{d}d0"),
            Data::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Data::Duration(d) => literal::format_duration(d),
            Data::String(s) => format!("\"{}\"", escape(s, '"')),
            Data::Identifier(s) => symbol(s),
            Data::QuotedSymbol(s) => format!("'{}'", escape(s, '\'')),
            Data::Blob(bytes) => format!("{{{{{}}}}}", STANDARD.encode(bytes)),
            Data::Clob(bytes) => {
                format!("{{{{\"{}\"}}}}", escape(&String::from_utf8_lossy(bytes), '"'))
            }
            Data::List(items) => self.print_sequence(items, indent, "[", "]", ","),
            Data::Sexp(items) => self.print_sequence(items, indent, "(", ")", ""),
            Data::Struct(fields) => self.print_struct(fields, indent),
        };
        out.push_str(&body);
        out
    }

    fn print_sequence(
        &self,
        items: &[Value],
        indent: usize,
        open: &str,
        close: &str,
        separator: &str,
    ) -> String {
        if items.is_empty() {
            return format!("{open}{close}");
        }

        if self.pretty {
            let items: Vec<String> = items
                .iter()
                .map(|v| format!("{}{}", self.indent(indent + 1), self.print_value(v, indent + 1)))
                .collect();
            format!(
                "{open}\n{}\n{}{close}",
                items.join(&format!("{separator}\n")),
                self.indent(indent)
            )
        } else {
            let items: Vec<String> = items.iter().map(|v| self.print_value(v, indent)).collect();
            let separator = if separator.is_empty() { " " } else { separator };
            format!("{open}{}{close}", items.join(separator))
        }
    }

    fn print_struct(&self, fields: &[(String, Value)], indent: usize) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }

        if self.pretty {
            let items: Vec<String> = fields
                .iter()
                .map(|(name, v)| {
                    format!(
                        "{}{}: {}",
                        self.indent(indent + 1),
                        symbol(name),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            format!("{{\n{}\n{}}}", items.join(",\n"), self.indent(indent))
        } else {
            let items: Vec<String> = fields
                .iter()
                .map(|(name, v)| format!("{}:{}", symbol(name), self.print_value(v, indent)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

fn float(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "+inf" } else { "-inf" }.to_string()
    } else {
        format!("{n:?}")
    }
}

fn is_plain_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_SYMBOLS.contains(&text)
}

fn symbol(text: &str) -> String {
    if is_plain_identifier(text) {
        text.to_string()
    } else {
        format!("'{}'", escape(text, '\''))
    }
}

fn escape(s: &str, quote: char) -> String {
    s.chars()
        .flat_map(|c| match c {
            c if c == quote => vec!['\\', c],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

/// Compact text form with annotations.
pub fn to_text(value: &Value) -> String {
    TextPrinter::compact().print(value)
}

/// Two-space indented text form with annotations.
pub fn to_text_pretty(value: &Value) -> String {
    TextPrinter::new(true).print(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_value;
    use rust_decimal::Decimal;

    #[test]
    fn prints_scalars() {
        assert_eq!(to_text(&Value::typed_null(Kind::Int)), "null.int");
        assert_eq!(to_text(&Value::float(3.0)), "3.0");
        assert_eq!(to_text(&Value::decimal(Decimal::new(150, 2))), "1.50d0");
        assert_eq!(to_text(&Value::identifier("true")), "'true'");
        assert_eq!(to_text(&Value::blob(b"hello".to_vec())), "{{aGVsbG8=}}");
    }

    #[test]
    fn quotes_odd_field_names_and_annotations() {
        let value = Value::structure([("first name", Value::int(1))]).with_annotations(["$indices:0"]);
        assert_eq!(to_text(&value), "'$indices:0'::{'first name':1}");
    }

    #[test]
    fn sexps_separate_with_spaces() {
        let value = Value::sexp([Value::identifier("a"), Value::int(1)]);
        assert_eq!(to_text(&value), "(a 1)");
        assert_eq!(to_text_pretty(&value), "(\n  a\n  1\n)");
    }

    #[test]
    fn printed_text_reads_back() {
        let text = "a::{x:[1,2.5,1.5d0,\"s\\n\"],y:(b 'c d'),z:null.list,t:2024-05-06T10:30:00Z,d:P1DT2H}";
        let value = parse_value(text).unwrap();
        assert_eq!(parse_value(&to_text(&value)).unwrap(), value);
        assert_eq!(to_text(&value), text);
    }
}
