//! Turns expression, path and query text into their typed forms.
//!
//! The grammar yields a generic syntax tree; the builders here walk it and
//! assemble [`Expression`]s bottom-up. Binary operator chains arrive flat
//! (`operand op operand op ...`) and are regrouped by precedence in
//! [`crate::grouping`].

use std::sync::Arc;

use crate::ast::{
    BinaryOperator, Constant, Expression, ExpressionKind, KindTest, MatchOperator, Origin,
    ParametrizedOperator, StateSelection, TypeCheck,
};
use crate::error::{ParseError, SyntaxError};
use crate::grouping::{self, Item};
use crate::matching::RegexCache;
use crate::options::Options;
use crate::path::{PathQuery, PathSegment, QuerySegment, QuerySelector, SegmentSyntax, segments};
use crate::syntax::{Rule, SyntaxNode};
use crate::tree::{DataTreeBuilder, DataTreeNode};
use crate::value::literal;

/// Parses text with a shared set of options and a shared regex cache.
///
/// Every expression built by one parser compiles its patterns through the
/// same [`RegexCache`], so a pattern used in many expressions is compiled
/// once.
#[derive(Debug, Clone)]
pub struct Parser {
    options: Options,
    regex_cache: Arc<RegexCache>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::with_options(Options::default())
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    pub fn with_options(options: Options) -> Self {
        let regex_cache = Arc::new(RegexCache::new(options.regex_cache_capacity));
        Parser {
            options,
            regex_cache,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn regex_cache(&self) -> &Arc<RegexCache> {
        &self.regex_cache
    }

    pub fn parse_expression(&self, text: &str) -> Result<Expression, ParseError> {
        let root = SyntaxNode::parse(Rule::expression_root, text)?;
        let expression = self.build_expression(&child(&root, "expression")?)?;
        log::debug!("parsed expression {expression} of kind {}", expression.kind());
        Ok(expression)
    }

    pub fn parse_path(&self, text: &str) -> Result<PathSegment, ParseError> {
        let root = SyntaxNode::parse(Rule::path_root, text)?;
        PathSegment::from_syntax(&child(&root, "path")?)
    }

    /// Parse a comma or whitespace separated list of paths and merge them
    /// into one data tree.
    pub fn parse_paths(&self, text: &str) -> Result<DataTreeNode, ParseError> {
        let root = SyntaxNode::parse(Rule::path_set, text)?;
        let mut builder = DataTreeBuilder::new();
        for path in root.find_nodes("path") {
            builder.add_path(&PathSegment::from_syntax(&path)?);
        }
        Ok(builder.build()?)
    }

    /// Parse a path whose steps may carry predicates. Optional markers are
    /// accepted but have no effect on a query.
    pub fn parse_query(&self, text: &str) -> Result<PathQuery, ParseError> {
        let root = SyntaxNode::parse(Rule::path_root, text)?;
        let path = child(&root, "path")?;
        let mut query = Vec::new();
        for (step, _) in segments(&path)? {
            let selector = match step {
                SegmentSyntax::Plain(selector) => QuerySelector::Plain(selector),
                SegmentSyntax::PropertyPredicate(body) => {
                    QuerySelector::PropertyWhere(self.predicate(&body)?)
                }
                SegmentSyntax::ItemPredicate(body) => QuerySelector::ItemWhere(self.predicate(&body)?),
            };
            query.push(QuerySegment { selector });
        }
        Ok(PathQuery::new(query))
    }

    fn predicate(&self, body: &SyntaxNode) -> Result<Expression, ParseError> {
        let predicate = self.build_expression(body)?;
        if !predicate.kind().accepts(ExpressionKind::Bool) {
            return Err(ParseError::TypeMismatch(format!(
                "predicate must be bool, found {} in {predicate}",
                predicate.kind()
            )));
        }
        Ok(predicate)
    }

    /// `operand (operator operand)*`, grouped by precedence.
    fn build_expression(&self, node: &SyntaxNode) -> Result<Expression, ParseError> {
        if node.child_count() == 1 {
            return self.build_operand(&child(node, "*")?);
        }
        let mut items = Vec::new();
        for part in node.children() {
            match binary_operator(part.rule()) {
                Some(operator) => items.push(Item::Operator(operator)),
                None => items.push(Item::Operand(self.build_operand(&part)?)),
            }
        }
        grouping::group(
            items,
            BinaryOperator::PRECEDENCE,
            BinaryOperator::associativity,
            Expression::binary,
        )
    }

    fn build_operand(&self, node: &SyntaxNode) -> Result<Expression, ParseError> {
        match node.rule() {
            Rule::negation => {
                let operand = node
                    .children()
                    .find(|part| part.rule() != Rule::not_keyword)
                    .ok_or_else(|| missing(node, "operand"))?;
                Expression::negation(self.build_operand(&operand)?)
            }
            Rule::existence => {
                let selection = child(node, "selection|relative_selection")?;
                Ok(Expression::Existence(self.build_selection(&selection)?))
            }
            Rule::concatenation => {
                let arguments = self.build_arguments(&child(node, "argument_list")?)?;
                Expression::concatenation(arguments)
            }
            Rule::postfix_operand => self.build_postfix(node),
            _ => self.build_primary(node),
        }
    }

    fn build_postfix(&self, node: &SyntaxNode) -> Result<Expression, ParseError> {
        let mut parts = node.children();
        let primary = parts.next().ok_or_else(|| missing(node, "operand"))?;
        let Some(operation) = parts.next() else {
            return self.build_primary(&primary);
        };

        match operation.rule() {
            Rule::type_check | Rule::negated_type_check => {
                let selection = match primary.rule() {
                    Rule::selection | Rule::relative_selection => self.build_selection(&primary)?,
                    _ => {
                        return Err(ParseError::TypeMismatch(format!(
                            "'is' applies to selections only, found '{}'",
                            primary.token_value()
                        )));
                    }
                };
                let name = child(&operation, "type_name")?.token_value();
                let test = KindTest::from_name(name)
                    .ok_or_else(|| ParseError::TypeMismatch(format!("unknown kind '{name}'")))?;
                Ok(Expression::TypeCheck(TypeCheck {
                    selection,
                    test,
                    negated: operation.rule() == Rule::negated_type_check,
                }))
            }
            Rule::in_operation
            | Rule::not_in_operation
            | Rule::between_operation
            | Rule::not_between_operation => {
                let operator = match operation.rule() {
                    Rule::in_operation => ParametrizedOperator::In,
                    Rule::not_in_operation => ParametrizedOperator::NotIn,
                    Rule::between_operation => ParametrizedOperator::Between,
                    _ => ParametrizedOperator::NotBetween,
                };
                let arguments = self.build_arguments(&child(&operation, "argument_list")?)?;
                Expression::parametrized(operator, self.build_primary(&primary)?, arguments)
            }
            Rule::matches_operation
            | Rule::starts_with_operation
            | Rule::ends_with_operation
            | Rule::contains_operation => {
                let operator = match operation.rule() {
                    Rule::matches_operation => MatchOperator::Matches,
                    Rule::starts_with_operation => MatchOperator::StartsWith,
                    Rule::ends_with_operation => MatchOperator::EndsWith,
                    _ => MatchOperator::Contains,
                };
                let argument = self.build_primary(&trailing_primary(&operation)?)?;
                Expression::string_matching(
                    operator,
                    self.build_primary(&primary)?,
                    argument,
                    Arc::clone(&self.regex_cache),
                )
            }
            Rule::has_annotation_operation => {
                let annotation = self.build_primary(&trailing_primary(&operation)?)?;
                Expression::has_annotation(self.build_primary(&primary)?, annotation)
            }
            rule => unreachable!("{rule:?} is not a postfix operation"),
        }
    }

    fn build_primary(&self, node: &SyntaxNode) -> Result<Expression, ParseError> {
        match node.rule() {
            Rule::expression => self.build_expression(node),
            Rule::selection | Rule::relative_selection => {
                Ok(Expression::Selection(self.build_selection(node)?))
            }
            Rule::key_reference => Ok(Expression::KeyReference),
            Rule::now_literal => Ok(Expression::Constant(Constant::Now)),
            Rule::null_literal
            | Rule::bool_literal
            | Rule::int_literal
            | Rule::float_literal
            | Rule::decimal_literal
            | Rule::day_timestamp
            | Rule::month_timestamp
            | Rule::year_timestamp
            | Rule::duration_literal
            | Rule::string_literal => Ok(Expression::Constant(Constant::Value(literal::scalar(node)?))),
            rule => unreachable!("{rule:?} is not a primary expression"),
        }
    }

    fn build_selection(&self, node: &SyntaxNode) -> Result<StateSelection, ParseError> {
        let (origin, path) = match node.rule() {
            Rule::relative_selection => {
                let relative = child(node, "relative_path")?;
                let path = relative
                    .find_node("path")
                    .map(|path| PathSegment::from_syntax(&path))
                    .transpose()?;
                (Origin::Current, path)
            }
            _ => (Origin::Document, Some(PathSegment::from_syntax(&child(node, "path")?)?)),
        };
        let expected = match node.find_node("type_name") {
            None => ExpressionKind::Any,
            Some(name) => ExpressionKind::from_name(name.token_value()).ok_or_else(|| {
                ParseError::TypeMismatch(format!(
                    "cannot select as unknown kind '{}'",
                    name.token_value()
                ))
            })?,
        };
        Ok(StateSelection {
            origin,
            path,
            expected,
        })
    }

    fn build_arguments(&self, node: &SyntaxNode) -> Result<Vec<Expression>, ParseError> {
        node.find_nodes("expression")
            .iter()
            .map(|argument| self.build_expression(argument))
            .collect()
    }
}

fn binary_operator(rule: Rule) -> Option<BinaryOperator> {
    Some(match rule {
        Rule::power => BinaryOperator::Power,
        Rule::multiply => BinaryOperator::Multiply,
        Rule::divide => BinaryOperator::Divide,
        Rule::modulus => BinaryOperator::Modulus,
        Rule::add => BinaryOperator::Add,
        Rule::subtract => BinaryOperator::Subtract,
        Rule::greater_or_equal => BinaryOperator::GreaterOrEqual,
        Rule::less_or_equal => BinaryOperator::LessOrEqual,
        Rule::not_equal => BinaryOperator::NotEqual,
        Rule::equal => BinaryOperator::Equal,
        Rule::greater_than => BinaryOperator::GreaterThan,
        Rule::less_than => BinaryOperator::LessThan,
        Rule::and_operator => BinaryOperator::And,
        Rule::xor_operator => BinaryOperator::Xor,
        Rule::nor_operator => BinaryOperator::Nor,
        Rule::or_operator => BinaryOperator::Or,
        _ => return None,
    })
}

/// The operand after the keywords of a postfix operation.
fn trailing_primary<'i>(operation: &SyntaxNode<'i>) -> Result<SyntaxNode<'i>, ParseError> {
    operation
        .children()
        .last()
        .filter(|part| !part.rule_name().ends_with("_keyword"))
        .ok_or_else(|| missing(operation, "argument"))
}

fn child<'i>(node: &SyntaxNode<'i>, query: &str) -> Result<SyntaxNode<'i>, ParseError> {
    let found = if query == "*" {
        node.first_child()
    } else {
        node.find_node(query)
    };
    found.ok_or_else(|| missing(node, query))
}

fn missing(node: &SyntaxNode, what: &str) -> ParseError {
    let (line, column) = node.position();
    ParseError::Syntax(SyntaxError::Internal {
        rule: node.rule_name(),
        line,
        column,
        message: format!("missing {what}"),
    })
}

pub fn parse_expression(text: &str) -> Result<Expression, ParseError> {
    Parser::default().parse_expression(text)
}

pub fn parse_path(text: &str) -> Result<PathSegment, ParseError> {
    Parser::default().parse_path(text)
}

pub fn parse_paths(text: &str) -> Result<DataTreeNode, ParseError> {
    Parser::default().parse_paths(text)
}

pub fn parse_query(text: &str) -> Result<PathQuery, ParseError> {
    Parser::default().parse_query(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ArithmeticOperator;

    #[test]
    fn groups_operators_by_precedence() {
        let expr = parse_expression("1 + 2 * 3 > 4 and true").unwrap();
        assert_eq!(expr.to_string(), "(((1 + (2 * 3)) > 4) and true)");
        assert_eq!(expr.kind(), ExpressionKind::Bool);
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse_expression("4 ^ -1 ^ 2 ^ 5").unwrap();
        assert_eq!(expr.to_string(), "(4 ^ (-1 ^ (2 ^ 5)))");
        let Expression::Arithmetic(binary) = expr else {
            panic!("expected arithmetic");
        };
        assert_eq!(binary.operator, ArithmeticOperator::Power);
    }

    #[test]
    fn selections_carry_their_expected_kind() {
        let expr = parse_expression("/order/total as decimal").unwrap();
        assert_eq!(expr.kind(), ExpressionKind::Decimal);
        assert_eq!(expr.to_string(), "/order/total as decimal");
        assert!(matches!(
            parse_expression("/a as widget"),
            Err(ParseError::TypeMismatch(_))
        ));
    }

    #[test]
    fn postfix_operations() {
        assert_eq!(
            parse_expression("/a is not null").unwrap().to_string(),
            "/a is not null"
        );
        assert_eq!(
            parse_expression("/s not in (\"x\", \"y\")").unwrap().to_string(),
            "/s not in (\"x\", \"y\")"
        );
        assert_eq!(
            parse_expression("/s starts with \"ab\"").unwrap().to_string(),
            "/s starts with \"ab\""
        );
        assert_eq!(
            parse_expression("@ has annotation \"tag\"").unwrap().to_string(),
            "@ has annotation \"tag\""
        );
    }

    #[test]
    fn type_checks_need_a_selection() {
        assert!(matches!(
            parse_expression("1 is int"),
            Err(ParseError::TypeMismatch(_))
        ));
    }

    #[test]
    fn kind_errors_surface_while_parsing() {
        assert!(matches!(
            parse_expression("1 + \"a\""),
            Err(ParseError::TypeMismatch(_))
        ));
        assert!(matches!(
            parse_expression("not 1"),
            Err(ParseError::TypeMismatch(_))
        ));
        assert!(matches!(
            parse_expression("/a between (1)"),
            Err(ParseError::TypeMismatch(_))
        ));
    }

    #[test]
    fn constant_patterns_are_compiled_once() {
        let parser = Parser::new();
        parser.parse_expression("/a matches \"^x+$\"").unwrap();
        parser.parse_expression("/b matches \"^x+$\"").unwrap();
        assert_eq!(parser.regex_cache().len(), 1);
        assert!(matches!(
            parser.parse_expression("/a matches \"(\""),
            Err(ParseError::InvalidLiteral { kind: "pattern", .. })
        ));
    }

    #[test]
    fn paths_with_predicates_are_queries_only() {
        assert!(matches!(
            parse_path("/a/.{# == \"b\"}"),
            Err(ParseError::InvalidPath { .. })
        ));
        let query = parse_query("/a/.{# == \"b\"}/[*]").unwrap();
        assert_eq!(query.segments().len(), 3);
        assert!(matches!(
            parse_query("/a/[{1 + 1}]"),
            Err(ParseError::TypeMismatch(_))
        ));
    }

    #[test]
    fn path_sets_merge_into_a_tree() {
        let tree = parse_paths("/a/b, /a/c? /d").unwrap();
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].children().len(), 2);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(parse_expression("1 +"), Err(ParseError::Syntax(_))));
        assert!(matches!(parse_path("a/b"), Err(ParseError::Syntax(_))));
    }
}
