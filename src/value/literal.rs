//! Decoding of scalar literal tokens shared by expressions and value text.

use chrono::{FixedOffset, Local, NaiveDate, TimeDelta, TimeZone};
use num_bigint::BigInt;
use rust_decimal::Decimal;

use super::{Kind, Timestamp, Value};
use crate::error::ParseError;
use crate::syntax::{Rule, SyntaxNode};

/// Build the value of a scalar literal node.
pub(crate) fn scalar(node: &SyntaxNode) -> Result<Value, ParseError> {
    let text = node.token_value();
    match node.rule() {
        Rule::null_literal => match node.find_node("type_name") {
            None => Ok(Value::null()),
            Some(name) => Kind::from_name(name.token_value())
                .map(Value::typed_null)
                .ok_or_else(|| ParseError::literal("null", text, "unknown kind")),
        },
        Rule::bool_literal => Ok(Value::bool(text == "true")),
        Rule::int_literal => text
            .parse::<BigInt>()
            .map(Value::int)
            .map_err(|err| ParseError::literal("int", text, err.to_string())),
        Rule::float_literal => text
            .parse::<f64>()
            .map(Value::float)
            .map_err(|err| ParseError::literal("float", text, err.to_string())),
        Rule::decimal_literal => parse_decimal(text).map(Value::decimal),
        Rule::day_timestamp | Rule::month_timestamp | Rule::year_timestamp => {
            timestamp(node).map(Value::timestamp)
        }
        Rule::duration_literal => parse_duration(text)
            .map(Value::duration)
            .map_err(|reason| ParseError::literal("duration", text, reason)),
        Rule::string_literal => Ok(Value::string(quoted_text(node, "string")?)),
        Rule::quoted_symbol => Ok(Value::quoted_symbol(quoted_text(node, "symbol")?)),
        Rule::identifier => Ok(Value::identifier(text)),
        rule => unreachable!("{rule:?} is not a scalar literal"),
    }
}

/// Unescaped contents of a string literal or quoted symbol node.
pub(crate) fn quoted_text(node: &SyntaxNode, kind: &'static str) -> Result<String, ParseError> {
    let raw = node
        .find_node("string_content|symbol_content")
        .map(|content| content.token_value())
        .unwrap_or_default();
    unescape(raw).map_err(|reason| ParseError::literal(kind, node.token_value(), reason))
}

pub(crate) fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '"' | '\'' | '/')) => out.push(c),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("bad unicode escape '\\u{hex}'"))?;
                out.push(char::from_u32(code).ok_or_else(|| format!("invalid code point {code:#x}"))?);
            }
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}

/// Decimal literals use `d` as their exponent marker: `1.5d0`, `12d-3`.
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, ParseError> {
    let normalized = text.replace(['d', 'D'], "e");
    Decimal::from_scientific(&normalized)
        .map_err(|err| ParseError::literal("decimal", text, err.to_string()))
}

pub(crate) fn now() -> Timestamp {
    Local::now().fixed_offset()
}

fn timestamp(node: &SyntaxNode) -> Result<Timestamp, ParseError> {
    let text = node.token_value();
    let invalid = |reason: &str| ParseError::literal("timestamp", text, reason);
    let number = |query: &str, default: u32| -> Result<u32, ParseError> {
        match node.find_node(query) {
            Some(part) => part
                .token_value()
                .parse::<u32>()
                .map_err(|err| invalid(&err.to_string())),
            None => Ok(default),
        }
    };

    let year = number("ts_year", 1)? as i32;
    let date = NaiveDate::from_ymd_opt(year, number("ts_month", 1)?, number("ts_day", 1)?)
        .ok_or_else(|| invalid("no such date"))?;

    let hour = number("ts_time.ts_hour", 0)?;
    let minute = number("ts_time.ts_minute", 0)?;
    let (second, nanos) = match node.find_node("ts_time.ts_second") {
        Some(part) => split_seconds(part.token_value()).ok_or_else(|| invalid("bad seconds"))?,
        None => (0, 0),
    };
    let naive = date
        .and_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| invalid("no such time of day"))?;

    match node.find_node("ts_zone") {
        Some(zone) => {
            let offset = parse_offset(zone.token_value()).ok_or_else(|| invalid("bad offset"))?;
            offset
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| invalid("ambiguous local time"))
        }
        None => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.fixed_offset())
            .ok_or_else(|| invalid("time does not exist in the local zone")),
    }
}

fn split_seconds(text: &str) -> Option<(u32, u32)> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let seconds = whole.parse().ok()?;
    let mut digits: String = fraction.chars().take(9).collect();
    while digits.len() < 9 {
        digits.push('0');
    }
    Some((seconds, digits.parse().ok()?))
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let (hours, minutes) = text.get(1..)?.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse an ISO-8601 duration such as `P2W`, `P1DT2H30M5.5S` or `-PT10S`.
pub(crate) fn parse_duration(text: &str) -> Result<TimeDelta, String> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = body
        .strip_prefix('P')
        .ok_or_else(|| "missing 'P' designator".to_string())?;

    let mut total = TimeDelta::zero();
    let mut amount = String::new();
    let mut in_time = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' => amount.push(ch),
            'T' => in_time = true,
            unit => {
                let part = duration_part(&amount, unit, in_time)
                    .ok_or_else(|| format!("bad component '{amount}{unit}'"))?;
                total = total
                    .checked_add(&part)
                    .ok_or_else(|| "duration out of range".to_string())?;
                amount.clear();
            }
        }
    }
    if !amount.is_empty() {
        return Err(format!("trailing number '{amount}'"));
    }
    Ok(if negative { -total } else { total })
}

fn duration_part(amount: &str, unit: char, in_time: bool) -> Option<TimeDelta> {
    if unit == 'S' && in_time {
        let (seconds, nanos) = split_seconds(amount)?;
        return TimeDelta::new(i64::from(seconds), nanos);
    }
    let count: i64 = amount.parse().ok()?;
    match (unit, in_time) {
        ('W', false) => TimeDelta::try_weeks(count),
        ('D', false) => TimeDelta::try_days(count),
        ('H', true) => TimeDelta::try_hours(count),
        ('M', true) => TimeDelta::try_minutes(count),
        _ => None,
    }
}

/// ISO-8601 text for a duration, using days as the largest unit.
pub(crate) fn format_duration(duration: &TimeDelta) -> String {
    if duration.is_zero() {
        return "PT0S".to_string();
    }
    let sign = if *duration < TimeDelta::zero() { "-" } else { "" };
    let magnitude = duration.abs();
    let days = magnitude.num_days();
    let hours = magnitude.num_hours() % 24;
    let minutes = magnitude.num_minutes() % 60;
    let seconds = magnitude.num_seconds() % 60;
    let nanos = magnitude.subsec_nanos();

    let mut out = format!("{sign}P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || nanos > 0 {
            if nanos > 0 {
                let fraction = format!("{nanos:09}");
                out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
            } else {
                out.push_str(&format!("{seconds}S"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_accept_iso_forms() {
        assert_eq!(parse_duration("P2W").unwrap(), TimeDelta::weeks(2));
        assert_eq!(
            parse_duration("P1DT2H30M5S").unwrap(),
            TimeDelta::days(1) + TimeDelta::hours(2) + TimeDelta::minutes(30) + TimeDelta::seconds(5)
        );
        assert_eq!(parse_duration("-PT10S").unwrap(), TimeDelta::seconds(-10));
        assert_eq!(parse_duration("PT0.5S").unwrap(), TimeDelta::milliseconds(500));
        assert!(parse_duration("P1H").is_err());
    }

    #[test]
    fn durations_format_back_to_iso() {
        assert_eq!(format_duration(&TimeDelta::weeks(2)), "P14D");
        assert_eq!(format_duration(&TimeDelta::seconds(-90)), "-PT1M30S");
        assert_eq!(format_duration(&TimeDelta::milliseconds(1500)), "PT1.5S");
        assert_eq!(format_duration(&TimeDelta::zero()), "PT0S");
    }

    #[test]
    fn decimals_use_d_exponent() {
        assert_eq!(parse_decimal("1.5d0").unwrap(), Decimal::new(15, 1));
        assert_eq!(parse_decimal("12d-3").unwrap(), Decimal::new(12, 3));
    }

    #[test]
    fn escapes_are_decoded() {
        assert_eq!(unescape(r#"a\"b\nA"#).unwrap(), "a\"b\nA");
        assert!(unescape(r"\q").is_err());
    }

    #[test]
    fn explicit_offsets_are_kept() {
        let node = SyntaxNode::parse(Rule::document, "2024-05-06T10:30:15.25+02:00").unwrap();
        let stamp = node.find_node("value.day_timestamp").unwrap();
        let value = timestamp(&stamp).unwrap();
        assert_eq!(value.offset().local_minus_utc(), 7200);
        assert_eq!(value.to_rfc3339(), "2024-05-06T10:30:15.250+02:00");
    }
}
