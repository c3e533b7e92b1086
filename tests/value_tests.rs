use chrono::{Datelike, Local, NaiveDate, TimeDelta, TimeZone, Timelike};
use rust_decimal::Decimal;
use trellis::{Data, Kind, ParseError, Value, parse_value, to_text, to_text_pretty};

fn read(text: &str) -> Value {
    parse_value(text).expect("value should parse")
}

#[test]
fn test_scalars() {
    assert_eq!(read("42"), Value::int(42));
    assert_eq!(read("-7"), Value::int(-7));
    assert_eq!(read("2.5"), Value::float(2.5));
    assert_eq!(read("1.5e3"), Value::float(1500.0));
    assert_eq!(read("12.50d0"), Value::decimal(Decimal::new(1250, 2)));
    assert_eq!(read("15d-1"), Value::decimal(Decimal::new(15, 1)));
    assert_eq!(read("true"), Value::bool(true));
    assert_eq!(read("\"a\\nb\""), Value::string("a\nb"));
    assert_eq!(read("open"), Value::identifier("open"));
    assert_eq!(read("'two words'"), Value::quoted_symbol("two words"));
}

#[test]
fn test_typed_nulls() {
    assert_eq!(read("null"), Value::null());
    assert_eq!(read("null.int").kind(), Kind::Int);
    assert!(read("null.struct").is_null());
    assert!(matches!(
        parse_value("null.widget"),
        Err(ParseError::InvalidLiteral { kind: "null", .. })
    ));
}

#[test]
fn test_timestamps_and_durations() {
    let ts = read("2024-03-01T10:30:15.250+02:00");
    let Data::Timestamp(t) = ts.data() else {
        panic!("expected timestamp, got {ts:?}");
    };
    assert_eq!(t.hour(), 10);
    assert_eq!(t.offset().local_minus_utc(), 2 * 3600);
    assert_eq!(t.nanosecond(), 250_000_000);
    assert_eq!(to_text(&ts), "2024-03-01T10:30:15.250+02:00");

    assert_eq!(read("P2W"), Value::duration(TimeDelta::weeks(2)));
    assert_eq!(
        read("P1DT2H30M5S"),
        Value::duration(TimeDelta::seconds(86_400 + 2 * 3600 + 30 * 60 + 5))
    );
    assert_eq!(read("-PT10S"), Value::duration(TimeDelta::seconds(-10)));
    assert_eq!(to_text(&read("P2W")), "P14D");
}

#[test]
fn test_reduced_precision_timestamps() {
    let month = read("2024-05T+02:00");
    let Data::Timestamp(t) = month.data() else {
        panic!("expected timestamp, got {month:?}");
    };
    assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2024, 5, 1, 0));
    assert_eq!(t.offset().local_minus_utc(), 2 * 3600);

    let year = read("2024TZ");
    let Data::Timestamp(t) = year.data() else {
        panic!("expected timestamp, got {year:?}");
    };
    assert_eq!((t.year(), t.month(), t.day(), t.minute()), (2024, 1, 1, 0));
    assert_eq!(t.offset().local_minus_utc(), 0);

    // Without a zone the local offset in force at that instant applies.
    for (text, date) in [
        ("2024-05T", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
        ("2024T", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
    ] {
        let value = read(text);
        let Data::Timestamp(t) = value.data() else {
            panic!("expected timestamp, got {value:?}");
        };
        let local = Local
            .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .unwrap();
        assert_eq!(t.date_naive(), date);
        assert_eq!(t.offset().local_minus_utc(), local.offset().local_minus_utc());
    }
}

#[test]
fn test_wide_ints() {
    let value = read("[123456789012345678901234567890, -9223372036854775809]");
    assert_eq!(to_text(&value), "[123456789012345678901234567890,-9223372036854775809]");
    assert_eq!(value.items().unwrap()[1].kind(), Kind::Int);
}

#[test]
fn test_lobs() {
    assert_eq!(read("{{aGVsbG8=}}"), Value::blob(b"hello".to_vec()));
    assert_eq!(read("{{\"raw text\"}}"), Value::clob(b"raw text".to_vec()));
    assert_eq!(to_text(&Value::blob(b"hello".to_vec())), "{{aGVsbG8=}}");
}

#[test]
fn test_containers_and_annotations() {
    let value = read("a::b::{ list: [1, two], sexp: (f 1 2), 'odd key': {} }");
    assert_eq!(value.annotations(), ["a".to_string(), "b".to_string()]);
    assert_eq!(value.len(), 3);
    assert_eq!(value.get("list").unwrap().kind(), Kind::List);
    assert_eq!(value.get("odd key"), Some(&Value::structure(Vec::<(String, Value)>::new())));
    assert_eq!(
        to_text(&value),
        "a::b::{list:[1,two],sexp:(f 1 2),'odd key':{}}"
    );
}

#[test]
fn test_pretty_printing() {
    let value = read("{a: [1, 2], b: {}}");
    assert_eq!(
        to_text_pretty(&value),
        "{\n  a: [\n    1,\n    2\n  ],\n  b: {}\n}"
    );
}

#[test]
fn test_printed_text_reads_back() {
    let original = read(
        "doc::{ id: 7, price: 19.99d0, when: 2024-01-02T03:04:05Z, tags: ['x y', z], \
         wait: PT90S, data: {{AAEC}}, none: null.string, sexp: (f 1) }",
    );
    assert_eq!(read(&to_text(&original)), original);
    assert_eq!(read(&to_text_pretty(&original)), original);
}

#[test]
fn test_compare_across_kinds() {
    use std::cmp::Ordering;
    assert_eq!(Value::int(2).compare(&Value::float(2.0)).unwrap(), Ordering::Equal);
    assert_eq!(
        Value::decimal(Decimal::new(25, 1)).compare(&Value::int(3)).unwrap(),
        Ordering::Less
    );
    assert_eq!(
        Value::string("b").compare(&Value::identifier("a")).unwrap(),
        Ordering::Greater
    );
    assert!(Value::int(1).compare(&Value::string("1")).is_err());
}

#[test]
fn test_rejects_malformed_text() {
    assert!(matches!(parse_value("[1, 2"), Err(ParseError::Syntax(_))));
    assert!(matches!(parse_value("{a 1}"), Err(ParseError::Syntax(_))));
    assert!(matches!(parse_value("1 2"), Err(ParseError::Syntax(_))));
}
