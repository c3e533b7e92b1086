use chrono::TimeDelta;
use num_bigint::BigInt;
use regex::Regex;
use rust_decimal::Decimal;
use trellis::{
    EvalError, EvaluationContext, ExpressionKind, Kind, Options, ParseError, Parser, Value,
    parse_expression, parse_value,
};

fn eval_expr(expr_str: &str, doc: &Value) -> Result<Value, EvalError> {
    let expr = parse_expression(expr_str).expect("expression should parse");
    expr.evaluate(&EvaluationContext::new(doc))
}

fn eval_const(expr_str: &str) -> Result<Value, EvalError> {
    eval_expr(expr_str, &Value::structure(Vec::<(String, Value)>::new()))
}

fn doc(text: &str) -> Value {
    parse_value(text).expect("document should parse")
}

#[test]
fn test_numeric_coercion() {
    assert_eq!(eval_const("1 + 2").unwrap(), Value::int(3));
    assert_eq!(eval_const("1 + 2.5").unwrap(), Value::float(3.5));
    assert_eq!(eval_const("1 + 2.5d0").unwrap(), Value::decimal(Decimal::new(35, 1)));
    assert_eq!(eval_const("7 / 2").unwrap(), Value::int(3));
    assert_eq!(eval_const("7.0 / 2").unwrap(), Value::float(3.5));
    assert_eq!(eval_const("7 % 4").unwrap(), Value::int(3));
}

#[test]
fn test_static_kinds() {
    assert_eq!(parse_expression("1 + 2").unwrap().kind(), ExpressionKind::Int);
    assert_eq!(parse_expression("1 * 2.0").unwrap().kind(), ExpressionKind::Float);
    assert_eq!(parse_expression("1 - 2d0").unwrap().kind(), ExpressionKind::Decimal);
    assert_eq!(parse_expression("/a + 1").unwrap().kind(), ExpressionKind::Number);
    assert_eq!(parse_expression("/a == 1").unwrap().kind(), ExpressionKind::Bool);
}

#[test]
fn test_power_groups_right_to_left() {
    let expr = parse_expression("2 ^ 3 ^ 2").unwrap();
    assert_eq!(expr.to_string(), "(2 ^ (3 ^ 2))");
    assert_eq!(eval_const("2 ^ 3 ^ 2").unwrap(), Value::int(512));
    assert_eq!(
        parse_expression("1 + 2 * 3 - 4").unwrap().to_string(),
        "((1 + (2 * 3)) - 4)"
    );
}

#[test]
fn test_logical_tiers() {
    let expr = parse_expression("true or false and false").unwrap();
    assert_eq!(expr.to_string(), "(true or (false and false))");
    assert_eq!(eval_const("true or false and false").unwrap(), Value::bool(true));
    assert_eq!(eval_const("true xor true").unwrap(), Value::bool(false));
    assert_eq!(eval_const("false nor false").unwrap(), Value::bool(true));
    assert_eq!(eval_const("not (1 > 2)").unwrap(), Value::bool(true));
}

#[test]
fn test_null_propagation() {
    let doc = doc("{a: null, b: 2}");
    assert_eq!(
        eval_expr("/a as int + 1", &doc).unwrap(),
        Value::typed_null(Kind::Int)
    );
    assert_eq!(
        eval_expr("/a + /b", &doc).unwrap(),
        Value::typed_null(Kind::Decimal)
    );
    assert_eq!(
        eval_expr("/a > 1", &doc).unwrap(),
        Value::typed_null(Kind::Bool)
    );
    assert_eq!(
        eval_expr("/a == 1 and true", &doc).unwrap(),
        Value::typed_null(Kind::Bool)
    );
    assert_eq!(
        eval_expr("concat(/a as string, \"x\")", &doc).unwrap(),
        Value::typed_null(Kind::String)
    );
}

#[test]
fn test_optional_selection_yields_typed_null() {
    let doc = doc("{a: {}}");
    assert_eq!(
        eval_expr("/a/b? as decimal", &doc).unwrap(),
        Value::typed_null(Kind::Decimal)
    );
    assert!(matches!(
        eval_expr("/a/b as decimal", &doc),
        Err(EvalError::SelectionMiss { .. })
    ));
}

#[test]
fn test_selection_kind_mismatch() {
    let doc = doc("{a: \"text\"}");
    assert!(matches!(
        eval_expr("/a as int", &doc),
        Err(EvalError::MismatchedSelectionType {
            found: Kind::String,
            ..
        })
    ));
}

#[test]
fn test_string_matching() {
    let doc = doc("{name: \"Dr. Watson\", code: \"abc\"}");
    assert_eq!(eval_expr("/name starts with \"Dr\"", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/name ends with \"son\"", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/name matches \"W.t\"", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/name contains \".\"", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/code contains \".\"", &doc).unwrap(), Value::bool(false));
    assert_eq!(eval_expr("/code starts with /name", &doc).unwrap(), Value::bool(false));
}

#[test]
fn test_temporal_arithmetic() {
    assert_eq!(
        eval_const("2024-03-01T10:00:00Z + PT2H == 2024-03-01T12:00:00Z").unwrap(),
        Value::bool(true)
    );
    assert_eq!(
        eval_const("2024-03-02T00:00:00Z - 2024-03-01T00:00:00Z").unwrap(),
        Value::duration(TimeDelta::days(1))
    );
    assert_eq!(
        eval_const("P1D + PT12H").unwrap(),
        Value::duration(TimeDelta::hours(36))
    );
    assert_eq!(eval_const("now > 2000-01-01").unwrap(), Value::bool(true));
    assert_eq!(
        parse_expression("now - P2W").unwrap().kind(),
        ExpressionKind::Timestamp
    );
}

#[test]
fn test_in_and_between() {
    let doc = doc("{s: \"b\", n: 3}");
    assert_eq!(eval_expr("/n between (1, 5)", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/n not between (4, 5)", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/s in (\"a\", \"b\")", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/s not in (\"a\")", &doc).unwrap(), Value::bool(true));
    assert_eq!(
        eval_expr("/s in (\"a\", null)", &doc).unwrap(),
        Value::typed_null(Kind::Bool)
    );
    assert_eq!(eval_expr("/n in (1, 3.0)", &doc).unwrap(), Value::bool(true));
}

#[test]
fn test_existence_and_type_checks() {
    let doc = doc("{a: {b: 1}, n: null}");
    assert_eq!(eval_expr("exists /a/b", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("exists /a/c", &doc).unwrap(), Value::bool(false));
    assert_eq!(eval_expr("exists /a/c?", &doc).unwrap(), Value::bool(false));
    assert_eq!(eval_expr("/a/b is int", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/a/b is number", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/a/b is string", &doc).unwrap(), Value::bool(false));
    assert_eq!(eval_expr("/n is null", &doc).unwrap(), Value::bool(true));
    assert_eq!(eval_expr("/missing is int", &doc).unwrap(), Value::bool(false));
    assert_eq!(eval_expr("/missing is not int", &doc).unwrap(), Value::bool(true));
}

#[test]
fn test_concatenation_and_annotations() {
    let doc = doc("{a: draft::1, name: \"x\"}");
    assert_eq!(
        eval_expr("concat(\"n=\", /a, \" \", true, \" \", /name)", &doc).unwrap(),
        Value::string("n=1 true x")
    );
    assert_eq!(
        eval_expr("/a has annotation \"draft\"", &doc).unwrap(),
        Value::bool(true)
    );
    assert_eq!(
        eval_expr("/name has annotation \"draft\"", &doc).unwrap(),
        Value::bool(false)
    );
}

#[test]
fn test_arithmetic_errors() {
    assert!(matches!(eval_const("1 / 0"), Err(EvalError::DivisionByZero)));
    assert!(matches!(eval_const("1.5 % 0.0"), Err(EvalError::DivisionByZero)));
    assert!(matches!(
        eval_expr("/a + 1", &doc("{a: \"x\"}")),
        Err(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn test_integers_are_unbounded() {
    let big = |text: &str| Value::int(text.parse::<BigInt>().unwrap());
    assert_eq!(eval_const("9223372036854775807 + 1").unwrap(), big("9223372036854775808"));
    assert_eq!(
        eval_const("99999999999999999999 * 99999999999999999999").unwrap(),
        big("9999999999999999999800000000000000000001")
    );
    assert_eq!(eval_const("99999999999999999999 > 1").unwrap(), Value::bool(true));
    assert_eq!(eval_const("-99999999999999999999 < 1.5").unwrap(), Value::bool(true));
    assert_eq!(eval_const("2 ^ 100 % 7").unwrap(), Value::int(2));
    let doc = doc("{n: 123456789012345678901234567890}");
    assert_eq!(
        eval_expr("/n - 1", &doc).unwrap(),
        big("123456789012345678901234567889")
    );
}

#[test]
fn test_numbers_outside_decimal_range() {
    assert_eq!(eval_const("1e30 > 1d0").unwrap(), Value::bool(true));
    assert_eq!(eval_const("1d0 < 1e30").unwrap(), Value::bool(true));
    assert_eq!(eval_const("1e30 + 1d0").unwrap(), Value::float(1e30 + 1.0));
    assert_eq!(
        eval_const("100000000000000000000000000000000 > 1.5d0").unwrap(),
        Value::bool(true)
    );
}

#[test]
fn test_pattern_results_survive_cache_eviction() {
    let parser = Parser::with_options(Options::default().with_regex_cache_capacity(1));
    let expr = parser.parse_expression("/s matches /p").unwrap();
    let patterns = ["^a+b", "[0-9]{2}$"];
    let subjects = ["aab", "b", "x12", "aaab9", "7", "ab42"];
    for round in 0..3 {
        for (i, subject) in subjects.iter().enumerate() {
            let pattern = patterns[(i + round) % patterns.len()];
            let document = Value::structure([
                ("s", Value::string(*subject)),
                ("p", Value::string(pattern)),
            ]);
            let expected = Regex::new(pattern).unwrap().is_match(subject);
            assert_eq!(
                expr.evaluate(&EvaluationContext::new(&document)).unwrap(),
                Value::bool(expected),
                "{subject} matches {pattern}"
            );
            assert!(parser.regex_cache().len() <= 1);
        }
    }
}

#[test]
fn test_key_reference_outside_predicate() {
    assert!(matches!(
        eval_const("# == 1"),
        Err(EvalError::NoCurrentNode("#"))
    ));
    assert!(matches!(
        eval_const("@ == 1"),
        Err(EvalError::NoCurrentNode("@"))
    ));
}

#[test]
fn test_parse_time_kind_errors() {
    for text in ["1 + \"a\"", "not 1", "1 and true", "\"a\" matches 1", "3 between (1, 2, 3)"] {
        assert!(
            matches!(parse_expression(text), Err(ParseError::TypeMismatch(_))),
            "{text} should be rejected"
        );
    }
}

#[test]
fn test_evaluation_is_repeatable() {
    let expr = parse_expression("/n * 2 > 5").unwrap();
    let doc = doc("{n: 3}");
    let context = EvaluationContext::new(&doc);
    for _ in 0..3 {
        assert_eq!(expr.evaluate(&context).unwrap(), Value::bool(true));
    }
}
