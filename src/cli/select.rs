//! Select values from a document by path or query

use super::{CliError, DocumentFormat};
use crate::error::EvalError;
use crate::options::Options;
use crate::parser::Parser;
use crate::path::MatchType;
use crate::value::Value;

/// Options for the select command
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub path: String,
    pub input: Option<String>,
    /// Run the path as a query and return every match as a list.
    pub all: bool,
    pub format: DocumentFormat,
    pub options: Options,
}

pub fn execute_select(options: &SelectOptions) -> Result<Value, CliError> {
    let parser = Parser::with_options(options.options.clone());
    let document = options.format.read(options.input.as_deref())?;

    if options.all {
        let query = parser.parse_query(&options.path)?;
        let matches = query.select_all(&document)?;
        log::debug!("query {query} matched {} values", matches.len());
        return Ok(Value::list(matches.into_iter().map(|m| m.value.clone())));
    }

    let path = parser.parse_path(&options.path)?;
    let selection = path.select(&document)?;
    match (selection.match_type, selection.value) {
        (MatchType::Hit, Some(value)) => Ok(value.clone()),
        (MatchType::Miss, _) => Err(EvalError::SelectionMiss {
            path: path.to_string(),
        }
        .into()),
        _ => Ok(Value::null()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(path: &str, all: bool) -> Result<Value, CliError> {
        execute_select(&SelectOptions {
            path: path.to_string(),
            input: Some("{a: [1, 2, 3], b: {c: x}}".to_string()),
            all,
            ..SelectOptions::default()
        })
    }

    #[test]
    fn selects_a_single_value() {
        assert_eq!(select("/b/c", false).unwrap(), Value::identifier("x"));
        assert_eq!(select("/b/d?", false).unwrap(), Value::null());
        assert!(matches!(select("/b/d", false), Err(CliError::Eval(_))));
    }

    #[test]
    fn queries_collect_every_match() {
        assert_eq!(
            select("/a/[{@ >= 2}]", true).unwrap(),
            Value::list([Value::int(2), Value::int(3)])
        );
    }
}
