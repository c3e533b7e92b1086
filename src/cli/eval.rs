//! Evaluate an expression against a document

use super::{CliError, DocumentFormat};
use crate::evaluator::EvaluationContext;
use crate::options::Options;
use crate::parser::Parser;
use crate::value::Value;

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    pub expression: String,
    /// Document text; evaluation without a document sees an empty struct.
    pub input: Option<String>,
    pub format: DocumentFormat,
    pub options: Options,
}

pub fn execute_eval(options: &EvalOptions) -> Result<Value, CliError> {
    let parser = Parser::with_options(options.options.clone());
    let expression = parser.parse_expression(&options.expression)?;
    let document = match options.input.as_deref() {
        Some(text) => options.format.read(Some(text))?,
        None => Value::structure(Vec::<(String, Value)>::new()),
    };
    Ok(expression.evaluate(&EvaluationContext::new(&document))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str, input: Option<&str>) -> Result<Value, CliError> {
        execute_eval(&EvalOptions {
            expression: expression.to_string(),
            input: input.map(str::to_string),
            ..EvalOptions::default()
        })
    }

    #[test]
    fn evaluates_against_the_document() {
        assert_eq!(
            eval("/a + 1", Some("{a: 41}")).unwrap(),
            Value::int(42)
        );
    }

    #[test]
    fn constant_expressions_need_no_document() {
        assert_eq!(eval("2 ^ 10", None).unwrap(), Value::int(1024));
    }

    #[test]
    fn missing_selections_fail() {
        assert!(matches!(
            eval("/missing == 1", None),
            Err(CliError::Eval(_))
        ));
    }
}
