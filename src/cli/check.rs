//! Validate an expression without evaluating it

use super::CliError;
use crate::ast::ExpressionKind;
use crate::options::Options;
use crate::parser::Parser;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to validate
    pub expression: String,
    /// Treat the text as a query path rather than an expression
    pub query: bool,
    pub options: Options,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The expression parsed and kind-checked; carries its static kind.
    Expression(ExpressionKind),
    /// The query parsed; carries its number of steps.
    Query(usize),
}

/// Parse and kind-check, reporting the first error found.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let parser = Parser::with_options(options.options.clone());
    if options.query {
        let query = parser.parse_query(&options.expression)?;
        return Ok(CheckResult::Query(query.segments().len()));
    }
    let expression = parser.parse_expression(&options.expression)?;
    Ok(CheckResult::Expression(expression.kind()))
}
