//! Programmatic access to the `trellis` command line.
//!
//! Each subcommand has an options struct and an `execute_*` function
//! returning a [`Value`]; the binary only reads stdin, calls into here and
//! prints.

mod check;
mod docs;
mod eval;
mod prune;
mod select;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use docs::{DocTopic, get_doc_topic, get_docs_overview};
pub use eval::{EvalOptions, execute_eval};
pub use prune::{PruneOptions, execute_prune};
pub use select::{SelectOptions, execute_select};

use std::io;

use thiserror::Error;

use crate::error::{EvalError, ParseError, PruneError};
use crate::output::{to_text, to_text_pretty};
use crate::value::{Value, parse_value};

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("prune error: {0}")]
    Prune(#[from] PruneError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no input provided, use --input or pipe a document to stdin")]
    NoInput,

    #[error("unknown documentation topic '{0}', run 'trellis docs' to list topics")]
    UnknownTopic(String),
}

/// How the input document is read and the result written.
#[derive(Debug, Clone, Default)]
pub struct DocumentFormat {
    /// JSON instead of the native text form.
    pub json: bool,
    pub pretty: bool,
}

impl DocumentFormat {
    pub fn read(&self, input: Option<&str>) -> Result<Value, CliError> {
        let text = input.ok_or(CliError::NoInput)?;
        if self.json {
            let json: serde_json::Value = serde_json::from_str(text)?;
            Ok(Value::from_json(json))
        } else {
            Ok(parse_value(text)?)
        }
    }

    pub fn write(&self, value: &Value) -> Result<String, CliError> {
        Ok(match (self.json, self.pretty) {
            (true, true) => serde_json::to_string_pretty(&value.to_json())?,
            (true, false) => serde_json::to_string(&value.to_json())?,
            (false, true) => to_text_pretty(value),
            (false, false) => to_text(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_formats() {
        let native = DocumentFormat::default();
        assert_eq!(native.read(Some("{a: 1}")).unwrap(), Value::structure([("a", Value::int(1))]));
        let json = DocumentFormat {
            json: true,
            pretty: false,
        };
        assert_eq!(json.read(Some(r#"{"a": 1}"#)).unwrap(), Value::structure([("a", Value::int(1))]));
        assert!(matches!(json.read(None), Err(CliError::NoInput)));
        assert!(matches!(json.read(Some("{")), Err(CliError::Json(_))));
    }

    #[test]
    fn writes_both_formats() {
        let value = Value::list([Value::int(1), Value::string("x")]);
        assert_eq!(DocumentFormat::default().write(&value).unwrap(), "[1,\"x\"]");
        let json = DocumentFormat {
            json: true,
            pretty: false,
        };
        assert_eq!(json.write(&value).unwrap(), "[1,\"x\"]");
    }
}
