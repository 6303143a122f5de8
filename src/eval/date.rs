//! Date builtins.
//!
//! Formats are strftime patterns. A format without any `%` is read as a
//! Go reference layout (`2006-01-02 15:04:05`) and translated.

use std::borrow::Cow;

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};

use super::EvalError;
use super::functions::Call;
use super::value::Value;

const MAX_DURATION_NANOS: f64 = 9.2e18;

/// Go layout elements and their strftime equivalents. Longer elements
/// come before their prefixes.
const LAYOUT_ELEMENTS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("Z07:00", "%:z"),
    ("Z0700", "%z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

pub fn now(_: &mut Call<'_>) -> Result<Value, EvalError> {
    Ok(Value::Time(Local::now().fixed_offset()))
}

pub fn date(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let t = in_zone(call.time(1)?, "Local");
    format(call, t, call.str(0)?)
}

pub fn date_in_zone(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let t = in_zone(call.time(1)?, call.str(2)?);
    format(call, t, call.str(0)?)
}

pub fn date_modify(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let spec = call.str(0)?;
    let delta =
        parse_duration(spec).ok_or_else(|| call.fail(format!("invalid duration {spec:?}")))?;
    call.time(1)?
        .checked_add_signed(delta)
        .map(Value::Time)
        .ok_or_else(|| call.fail("date out of range"))
}

pub fn duration(call: &mut Call<'_>) -> Result<Value, EvalError> {
    Ok(Value::Str(format_seconds(call.int(0)?)))
}

/// Parse in local time. A format carrying an offset (`%z`) keeps it.
pub fn to_date(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let (fmt, text) = (layout(call.str(0)?), call.str(1)?);
    let fmt: &str = &fmt;
    if let Ok(t) = DateTime::parse_from_str(text, fmt) {
        return Ok(Value::Time(t));
    }
    let naive = NaiveDateTime::parse_from_str(text, fmt)
        .or_else(|_| NaiveDate::parse_from_str(text, fmt).map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|err| call.fail(err))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| Value::Time(t.fixed_offset()))
        .ok_or_else(|| call.fail(format!("{text:?} does not exist in the local zone")))
}

pub fn unix_epoch(call: &mut Call<'_>) -> Result<Value, EvalError> {
    Ok(Value::Int(call.time(0)?.timestamp()))
}

fn format(call: &Call<'_>, t: DateTime<FixedOffset>, fmt: &str) -> Result<Value, EvalError> {
    let pattern = layout(fmt);
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if items.contains(&Item::Error) {
        return Err(call.fail(format!("invalid date format {fmt:?}")));
    }
    Ok(Value::Str(t.format_with_items(items.iter()).to_string()))
}

/// Strftime pattern for `fmt`, translating a Go layout when `fmt` has
/// no `%`.
fn layout(fmt: &str) -> Cow<'_, str> {
    if fmt.contains('%') {
        return Cow::Borrowed(fmt);
    }
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut rest = fmt;
    while let Some(c) = rest.chars().next() {
        if let Some((element, pattern)) = LAYOUT_ELEMENTS
            .iter()
            .find(|(element, _)| rest.starts_with(element))
        {
            out.push_str(pattern);
            rest = &rest[element.len()..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Cow::Owned(out)
}

/// Convert to `UTC`, `Local` or a fixed `±HH:MM` offset. Unknown zones
/// fall back to UTC.
fn in_zone(t: DateTime<FixedOffset>, zone: &str) -> DateTime<FixedOffset> {
    match zone {
        "Local" => t.with_timezone(&Local).fixed_offset(),
        "UTC" => t.with_timezone(&Utc).fixed_offset(),
        other => parse_offset(other).map_or_else(
            || {
                tracing::debug!(zone = other, "unknown time zone, using UTC");
                t.with_timezone(&Utc).fixed_offset()
            },
            |offset| t.with_timezone(&offset),
        ),
    }
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if !zone.is_ascii() {
        return None;
    }
    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let (hours, minutes): (i32, i32) = (hours.parse().ok()?, minutes.parse().ok()?);
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Durations like `-1.5h` or `2h45m30s`; units are `ns`, `us`, `ms`,
/// `s`, `m` and `h`.
#[allow(clippy::cast_possible_truncation)]
fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if number_len == 0 {
            return None;
        }
        let amount: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        nanos += amount * scale;
        rest = &rest[unit_len..];
    }

    if nanos > MAX_DURATION_NANOS {
        return None;
    }
    let nanos = nanos.round() as i64;
    Some(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

/// `95` is `1m35s`, `3600` is `1h0m0s`.
fn format_seconds(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let total = secs.unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}
