//! Conversion of DuckDB cells into JSON values.

use base64::Engine as _;
use chrono::{DateTime, NaiveTime};
use duckdb::types::{TimeUnit, Value, ValueRef};
use serde_json::Value as JsonValue;

/// Converts a single cell to JSON.
///
/// Integers that do not fit in 64 bits are rendered as strings, non-finite
/// floats as `null`, and temporal values in DuckDB's own text format. Lists
/// and arrays become JSON arrays, structs and maps become objects, and enums
/// become their label.
pub fn to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Text(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => base64_string(b),
        ValueRef::Enum(..) => value
            .as_str()
            .map(|label| JsonValue::String(label.to_owned()))
            .unwrap_or(JsonValue::Null),
        other => owned_to_json(&other.to_owned()),
    }
}

/// Like [`to_json`], for a cell of a `TIMESTAMP WITH TIME ZONE` column when
/// `zoned` is set. Those instants are rendered in UTC with a `+00` suffix.
pub fn cell_to_json(value: ValueRef<'_>, zoned: bool) -> JsonValue {
    match value {
        ValueRef::Timestamp(unit, v) if zoned => match timestamp_text(unit, v) {
            Some(text) => JsonValue::String(format!("{}+00", text)),
            None => JsonValue::Number(v.into()),
        },
        other => to_json(other),
    }
}

fn owned_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::TinyInt(i) => JsonValue::Number((*i).into()),
        Value::SmallInt(i) => JsonValue::Number((*i).into()),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::BigInt(i) => JsonValue::Number((*i).into()),
        Value::HugeInt(i) => match i64::try_from(*i) {
            Ok(n) => JsonValue::Number(n.into()),
            Err(_) => JsonValue::String(i.to_string()),
        },
        Value::UHugeInt(i) => match u64::try_from(*i) {
            Ok(n) => JsonValue::Number(n.into()),
            Err(_) => JsonValue::String(i.to_string()),
        },
        Value::UTinyInt(i) => JsonValue::Number((*i).into()),
        Value::USmallInt(i) => JsonValue::Number((*i).into()),
        Value::UInt(i) => JsonValue::Number((*i).into()),
        Value::UBigInt(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => float(*f as f64),
        Value::Double(f) => float(*f),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s.clone()),
        Value::Blob(b) | Value::Geometry(b) => base64_string(b),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
            .map(|dt| JsonValue::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| JsonValue::Number((*days).into())),
        Value::Timestamp(unit, v) => timestamp_text(*unit, *v)
            .map(JsonValue::String)
            .unwrap_or_else(|| JsonValue::Number((*v).into())),
        Value::Time64(unit, v) => {
            let micros = to_micros(*unit, *v);
            let secs = micros.div_euclid(1_000_000);
            let nanos = micros.rem_euclid(1_000_000) * 1_000;
            u32::try_from(secs)
                .ok()
                .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, nanos as u32))
                .map(|t| JsonValue::String(t.to_string()))
                .unwrap_or_else(|| JsonValue::Number((*v).into()))
        }
        Value::Interval {
            months,
            days,
            nanos,
        } => JsonValue::String(interval_text(*months, *days, *nanos)),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.iter().map(owned_to_json).collect())
        }
        Value::Struct(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), owned_to_json(v)))
                .collect(),
        ),
        Value::Map(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| (map_key(k), owned_to_json(v)))
                .collect(),
        ),
        Value::Union(inner) => owned_to_json(inner),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Object keys for MAP entries: strings as-is, anything else in its JSON form.
fn map_key(key: &Value) -> String {
    match owned_to_json(key) {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

fn base64_string(bytes: &[u8]) -> JsonValue {
    JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn float(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn timestamp_text(unit: TimeUnit, v: i64) -> Option<String> {
    DateTime::from_timestamp_micros(to_micros(unit, v)).map(|dt| dt.naive_utc().to_string())
}

fn to_micros(unit: TimeUnit, v: i64) -> i64 {
    match unit {
        TimeUnit::Second => v.saturating_mul(1_000_000),
        TimeUnit::Millisecond => v.saturating_mul(1_000),
        TimeUnit::Microsecond => v,
        TimeUnit::Nanosecond => v / 1_000,
    }
}

/// Renders an interval the way DuckDB prints one, e.g. `1 year 2 months 3 days 04:05:06`.
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    let mut parts = Vec::new();
    let years = months / 12;
    let months = months % 12;
    if years != 0 {
        parts.push(unit_count(years, "year"));
    }
    if months != 0 {
        parts.push(unit_count(months, "month"));
    }
    if days != 0 {
        parts.push(unit_count(days, "day"));
    }

    let micros = nanos / 1_000;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let hours = total / 3_600_000_000;
        let minutes = total % 3_600_000_000 / 60_000_000;
        let seconds = total % 60_000_000 / 1_000_000;
        let fraction = total % 1_000_000;
        let mut clock = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

fn unit_count(n: i32, unit: &str) -> String {
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}
