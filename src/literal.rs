//! Conversion of literal token text into scalar values.
//!
//! Integers honour the `0x`, `0o` and `0b` prefixes, an optional sign
//! and `_` digit separators. Anything that is not an `i64` is read as
//! an `f64`, hexadecimal mantissas with a `p` exponent included.

use crate::value::{Complex, Scalar};

/// Parse an integer or float literal.
#[must_use]
pub fn parse_number(text: &str) -> Option<Scalar> {
    parse_int(text)
        .map(Scalar::Int)
        .or_else(|| parse_float(text).map(Scalar::Float))
}

/// Parse `re±imi` or a lone imaginary `imi`.
#[must_use]
pub fn parse_complex(text: &str) -> Option<Complex> {
    let body = text.strip_suffix('i')?;

    let splits = body
        .char_indices()
        .filter(|&(idx, c)| idx > 0 && (c == '+' || c == '-'))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    for &idx in splits.iter().rev() {
        if let (Some(re), Some(im)) = (parse_float(&body[..idx]), parse_float(&body[idx..])) {
            return Some(Complex::new(re, im));
        }
    }

    parse_float(body).map(|im| Complex::new(0.0, im))
}

#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[must_use]
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = split_sign(text);
    let (radix, digits) = split_radix(rest);
    let mut cleaned = String::with_capacity(digits.len() + 1);
    if negative {
        cleaned.push('-');
    }
    cleaned.extend(digits.chars().filter(|&c| c != '_'));
    i64::from_str_radix(&cleaned, radix).ok()
}

#[must_use]
pub fn parse_float(text: &str) -> Option<f64> {
    let (negative, rest) = split_sign(text);
    let cleaned: String = rest.chars().filter(|&c| c != '_').collect();

    let magnitude = match split_radix(&cleaned) {
        (16, digits) => parse_hex_float(digits)?,
        (10, digits) if digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
            digits.parse::<f64>().ok()?
        }
        _ => return None,
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

fn split_radix(text: &str) -> (u32, &str) {
    let prefixes = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    prefixes
        .iter()
        .find_map(|&(prefix, radix)| text.strip_prefix(prefix).map(|digits| (radix, digits)))
        .unwrap_or((10, text))
}

/// Hex mantissa with optional fraction and binary exponent: `1.8p3`.
fn parse_hex_float(text: &str) -> Option<f64> {
    let (mantissa, exponent) = match text.find(['p', 'P']) {
        Some(idx) => (&text[..idx], text[idx + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut value = 0.0_f64;
    for c in whole.chars() {
        value = value.mul_add(16.0, f64::from(c.to_digit(16)?));
    }
    let mut scale = 1.0_f64 / 16.0;
    for c in fraction.chars() {
        value += f64::from(c.to_digit(16)?) * scale;
        scale /= 16.0;
    }

    Some(value * 2.0_f64.powi(exponent))
}
