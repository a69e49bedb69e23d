//! Conversions from a reflected leaf to plain Rust values.
//!
//! Numeric coercions fall back to zero *without* an error for values that are
//! neither numbers nor nil (booleans, structs, strings...). Callers that need
//! to tell a real `0` from an unsupported type must inspect the raw value.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use facet_reflect::{HasFields, Peek};

use crate::{Operation, QueryError, QueryErrorKind, resolve::deref};

/// Epoch values with a larger magnitude are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 9_999_999_999;

/// Layout tried after the two RFC 3339 forms.
const DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

fn nil(operation: Operation) -> QueryError {
    QueryError::new(operation, QueryErrorKind::NilValue)
}

pub(crate) fn to_string(value: Option<Peek<'_, '_>>) -> Result<String, QueryError> {
    let peek = value.and_then(deref).ok_or_else(|| nil(Operation::String))?;
    let mut out = String::new();
    render(peek, &mut out);
    Ok(out)
}

/// `Display` when the type has it. Otherwise sequences render as `[a b]`,
/// maps as `map[k:v]` and structs as `{a b}`, recursively.
fn render(peek: Peek<'_, '_>, out: &mut String) {
    let Some(peek) = deref(peek) else {
        out.push_str("<nil>");
        return;
    };
    if let Some(s) = peek.as_str() {
        out.push_str(s);
    } else if peek.vtable().has_display() {
        out.push_str(&peek.to_string());
    } else if let Ok(list) = peek.into_list_like() {
        out.push('[');
        join(list.iter(), out, render);
        out.push(']');
    } else if let Ok(map) = peek.into_map() {
        out.push_str("map[");
        join(map.iter(), out, |(key, value), out| {
            render(key, out);
            out.push(':');
            render(value, out);
        });
        out.push(']');
    } else if let Ok(record) = peek.into_struct() {
        out.push('{');
        join(record.fields().map(|(_, value)| value), out, render);
        out.push('}');
    } else {
        out.push_str(&peek.to_string());
    }
}

fn join<T>(
    items: impl Iterator<Item = T>,
    out: &mut String,
    mut each: impl FnMut(T, &mut String),
) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        each(item, out);
    }
}

pub(crate) fn to_int(value: Option<Peek<'_, '_>>) -> Result<i64, QueryError> {
    let peek = value.and_then(deref).ok_or_else(|| nil(Operation::Int))?;
    Ok(numeric_i64(peek).unwrap_or(0))
}

pub(crate) fn to_float(value: Option<Peek<'_, '_>>) -> Result<f64, QueryError> {
    let peek = value.and_then(deref).ok_or_else(|| nil(Operation::Float))?;
    Ok(numeric_f64(peek).unwrap_or(0.0))
}

pub(crate) fn to_timestamp(
    value: Option<Peek<'_, '_>>,
) -> Result<DateTime<FixedOffset>, QueryError> {
    let peek = value.and_then(deref).ok_or_else(|| nil(Operation::Timestamp))?;
    let shape = peek.shape();
    let incompatible = || {
        QueryError::new(
            Operation::Timestamp,
            QueryErrorKind::IncompatibleType {
                target: "timestamp",
                actual: shape.to_string(),
            },
        )
    };

    if let Ok(t) = peek.get::<DateTime<Utc>>() {
        return Ok(t.fixed_offset());
    }
    if let Ok(t) = peek.get::<DateTime<FixedOffset>>() {
        return Ok(*t);
    }
    if let Some(text) = peek.as_str() {
        return parse_timestamp(text).ok_or_else(incompatible);
    }
    if let Some(epoch) = numeric_i64(peek) {
        return from_epoch(epoch).ok_or_else(incompatible);
    }
    Err(incompatible())
}

fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    // parse_from_rfc3339 accepts both the fractional and the plain form.
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t);
    }
    NaiveDateTime::parse_from_str(text, DATETIME_LAYOUT)
        .ok()
        .map(|t| t.and_utc().fixed_offset())
}

fn from_epoch(epoch: i64) -> Option<DateTime<FixedOffset>> {
    let t = if epoch.unsigned_abs() > EPOCH_MILLIS_THRESHOLD {
        DateTime::<Utc>::from_timestamp_millis(epoch)
    } else {
        DateTime::<Utc>::from_timestamp(epoch, 0)
    };
    t.map(|t| t.fixed_offset())
}

macro_rules! numeric_as {
    ($peek:expr => $target:ty; $($ty:ty),+ $(,)?) => {{
        let peek = $peek;
        $(
            if let Ok(v) = peek.get::<$ty>() {
                return Some(*v as $target);
            }
        )+
        None
    }};
}

/// Any integer or float, floats truncated toward zero.
fn numeric_i64(peek: Peek<'_, '_>) -> Option<i64> {
    numeric_as!(peek => i64;
        i64, i32, i16, i8, isize, i128,
        u64, u32, u16, u8, usize, u128,
        f64, f32,
    )
}

fn numeric_f64(peek: Peek<'_, '_>) -> Option<f64> {
    numeric_as!(peek => f64;
        f64, f32,
        i64, i32, i16, i8, isize, i128,
        u64, u32, u16, u8, usize, u128,
    )
}
