use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{Value, literal};
use crate::error::ParseError;
use crate::syntax::{Rule, SyntaxNode};

/// Read a value from its text form.
///
/// ```
/// use trellis::{Value, parse_value};
///
/// let value = parse_value("tag::{ name: \"Ada\", scores: [1, 2.5, 3d0] }").unwrap();
/// assert_eq!(value.annotations(), ["tag"]);
/// assert_eq!(value.get("name"), Some(&Value::string("Ada")));
/// ```
pub fn parse_value(text: &str) -> Result<Value, ParseError> {
    let root = SyntaxNode::parse(Rule::document, text)?;
    let node = root
        .find_node("value")
        .ok_or_else(|| ParseError::literal("value", text, "empty document"))?;
    build(&node)
}

fn build(node: &SyntaxNode) -> Result<Value, ParseError> {
    let mut annotations = Vec::new();
    let mut body = None;
    for child in node.children() {
        match child.rule() {
            Rule::annotation => annotations.push(symbol_text(&child)?),
            _ => body = Some(child),
        }
    }
    let body = body.ok_or_else(|| ParseError::literal("value", node.token_value(), "missing body"))?;
    Ok(build_body(&body)?.with_annotations(annotations))
}

fn build_body(node: &SyntaxNode) -> Result<Value, ParseError> {
    match node.rule() {
        Rule::list_value => Ok(Value::list(
            node.children().map(|child| build(&child)).collect::<Result<Vec<_>, _>>()?,
        )),
        Rule::sexp_value => Ok(Value::sexp(
            node.children().map(|child| build(&child)).collect::<Result<Vec<_>, _>>()?,
        )),
        Rule::struct_value => {
            let mut fields = Vec::new();
            for field in node.children() {
                let mut parts = field.children();
                let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                    return Err(ParseError::literal("struct", field.token_value(), "incomplete field"));
                };
                fields.push((symbol_text(&name)?, build(&value)?));
            }
            Ok(Value::structure(fields))
        }
        Rule::blob_literal => {
            let encoded = node.find_node("blob_content").map(|c| c.token_value()).unwrap_or_default();
            STANDARD
                .decode(encoded)
                .map(Value::blob)
                .map_err(|err| ParseError::literal("blob", node.token_value(), err.to_string()))
        }
        Rule::clob_literal => {
            let text = node
                .find_node("string_literal")
                .map(|s| literal::quoted_text(&s, "clob"))
                .transpose()?
                .unwrap_or_default();
            Ok(Value::clob(text.into_bytes()))
        }
        _ => literal::scalar(node),
    }
}

/// Name carried by an annotation, field name or symbol node.
fn symbol_text(node: &SyntaxNode) -> Result<String, ParseError> {
    let inner = match node.rule() {
        Rule::annotation => node.first_child(),
        _ => Some(node.clone()),
    };
    match inner {
        Some(n) if n.rule() == Rule::identifier => Ok(n.token_value().to_string()),
        Some(n) if n.rule() == Rule::quoted_symbol => literal::quoted_text(&n, "symbol"),
        Some(n) if n.rule() == Rule::string_literal => literal::quoted_text(&n, "string"),
        _ => Err(ParseError::literal("symbol", node.token_value(), "expected a name")),
    }
}
