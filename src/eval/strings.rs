//! Case conversions backing the `snakecase` family of builtins.

/// Split into words on separators, lower-to-upper transitions and the
/// end of an acronym (`HTTPServer` is `HTTP` + `Server`).
fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (idx, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[idx - 1];
            let next_lower = chars.get(idx + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn joined_lower(s: &str, separator: &str) -> String {
    words(s)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

#[must_use]
pub fn snake_case(s: &str) -> String {
    joined_lower(s, "_")
}

#[must_use]
pub fn kebab_case(s: &str) -> String {
    joined_lower(s, "-")
}

/// `http_server` to `HttpServer`. Leading and trailing underscores are
/// kept; inside the string a run of underscores loses one.
#[must_use]
pub fn camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut at_start = true;
    let mut capitalize = true;

    while let Some(c) = chars.next() {
        if c == '_' {
            let mut run = 1;
            while chars.peek() == Some(&'_') {
                chars.next();
                run += 1;
            }
            let keep = if at_start || chars.peek().is_none() {
                run
            } else {
                run - 1
            };
            out.extend(std::iter::repeat_n('_', keep));
            capitalize = true;
            continue;
        }
        at_start = false;
        if capitalize {
            out.extend(c.to_uppercase());
            capitalize = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[must_use]
pub fn swap_case(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                c.to_uppercase().collect::<Vec<_>>()
            }
        })
        .collect()
}

/// Upper-case the first letter of every word. Anything other than a
/// letter, digit or underscore separates words.
#[must_use]
pub fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.chars() {
        if boundary && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        boundary = !(c.is_alphanumeric() || c == '_');
    }
    out
}

/// Byte-based substring clamped to char boundaries.
///
/// A negative `start` reads from the beginning; a negative or
/// out-of-range `end` reads to the end.
#[must_use]
pub fn substr(s: &str, start: i64, end: i64) -> String {
    let clamp = |n: i64| {
        let mut idx = usize::try_from(n).unwrap_or(0).min(s.len());
        while !s.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    };
    let from = if start < 0 { 0 } else { clamp(start) };
    let to = if end < 0 { s.len() } else { clamp(end) };
    if from >= to {
        return String::new();
    }
    s[from..to].to_string()
}
