//! Prune a document down to a set of paths

use super::{CliError, DocumentFormat};
use crate::options::Options;
use crate::parser::Parser;
use crate::value::Value;

/// Options for the prune command
#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    /// Comma or whitespace separated paths.
    pub paths: String,
    pub input: Option<String>,
    /// Only check the document; the result is `true` when it passes.
    pub validate_only: bool,
    pub format: DocumentFormat,
    pub options: Options,
}

pub fn execute_prune(options: &PruneOptions) -> Result<Value, CliError> {
    let parser = Parser::with_options(options.options.clone());
    let tree = parser.parse_paths(&options.paths)?;
    log::debug!("data tree:\n{tree}");
    let document = options.format.read(options.input.as_deref())?;
    let pruned = tree.prune_with(&document, &options.options)?;
    if options.validate_only {
        return Ok(Value::bool(true));
    }
    Ok(pruned)
}
