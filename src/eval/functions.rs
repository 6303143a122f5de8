//! Builtin function registry.
//!
//! Arguments arrive in call order with any piped value last, so a
//! function reading "the subject" takes it from its final parameter:
//! `"hello-" | trimSuffix "-"` calls `trimSuffix("-", "hello-")`.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use regex::Regex;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::value::Value;
use super::{EvalError, date, strings};

/// Upper bound on the output of `repeat`.
const MAX_REPEAT_BYTES: usize = 1 << 24;

static NIL: Value = Value::Nil;

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Arguments of one builtin invocation.
pub struct Call<'a> {
    name: &'a str,
    args: Vec<Value>,
    rng: &'a mut StdRng,
}

impl<'a> Call<'a> {
    pub(crate) const fn new(name: &'a str, args: Vec<Value>, rng: &'a mut StdRng) -> Self {
        Self { name, args, rng }
    }

    #[must_use]
    pub const fn name(&self) -> &str {
        self.name
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub fn arg(&self, idx: usize) -> &Value {
        self.args.get(idx).unwrap_or(&NIL)
    }

    pub const fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    /// # Errors
    ///
    /// Fails unless the argument is a string.
    pub fn str(&self, idx: usize) -> Result<&str, EvalError> {
        match self.arg(idx) {
            Value::Str(s) => Ok(s),
            _ => Err(self.mismatch(idx, "string")),
        }
    }

    /// Integer view of an argument: floats truncate, strings are parsed,
    /// booleans count as 0 or 1 and nil is 0.
    ///
    /// # Errors
    ///
    /// Fails for lists, maps, times and non-numeric strings.
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(&self, idx: usize) -> Result<i64, EvalError> {
        match self.arg(idx) {
            Value::Int(n) => Ok(*n),
            Value::Float(x) => Ok(x.trunc() as i64),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Nil => Ok(0),
            Value::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| self.mismatch(idx, "integer")),
            _ => Err(self.mismatch(idx, "integer")),
        }
    }

    /// # Errors
    ///
    /// Fails unless the argument is a list or nil.
    pub fn list(&self, idx: usize) -> Result<&[Value], EvalError> {
        match self.arg(idx) {
            Value::List(items) => Ok(items),
            Value::Nil => Ok(&[]),
            _ => Err(self.mismatch(idx, "list")),
        }
    }

    /// Time view of an argument: integers are seconds since the epoch,
    /// strings are RFC 3339.
    ///
    /// # Errors
    ///
    /// Fails for anything else.
    pub fn time(&self, idx: usize) -> Result<DateTime<FixedOffset>, EvalError> {
        match self.arg(idx) {
            Value::Time(t) => Ok(*t),
            Value::Int(secs) => DateTime::<Utc>::from_timestamp(*secs, 0)
                .map(|t| t.fixed_offset())
                .ok_or_else(|| self.fail(format!("timestamp {secs} out of range"))),
            Value::Str(s) => DateTime::parse_from_rfc3339(s).map_err(|err| self.fail(err)),
            _ => Err(self.mismatch(idx, "time")),
        }
    }

    #[must_use]
    pub fn mismatch(&self, idx: usize, expected: &str) -> EvalError {
        EvalError::Argument {
            name: self.name.to_string(),
            message: format!(
                "argument {} must be a {expected}, got {}",
                idx + 1,
                self.arg(idx).type_name()
            ),
        }
    }

    #[must_use]
    pub fn fail(&self, message: impl fmt::Display) -> EvalError {
        EvalError::Failed {
            name: self.name.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Func = fn(&mut Call<'_>) -> Result<Value, EvalError>;

/// A named builtin with its documentation.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub summary: &'static str,
    pub usage: &'static str,
    func: Func,
}

impl Builtin {
    #[must_use]
    pub const fn new(
        name: &'static str,
        arity: Arity,
        func: Func,
        summary: &'static str,
        usage: &'static str,
    ) -> Self {
        Self {
            name,
            arity,
            summary,
            usage,
            func,
        }
    }

    /// # Errors
    ///
    /// Returns whatever the function reports.
    pub fn call(&self, call: &mut Call<'_>) -> Result<Value, EvalError> {
        (self.func)(call)
    }
}

/// Name-ordered table of builtins.
#[derive(Debug, Clone, Default)]
pub struct Functions {
    table: BTreeMap<&'static str, Builtin>,
}

impl Functions {
    /// The full builtin library.
    #[must_use]
    pub fn standard() -> Self {
        let mut functions = Self::default();
        for builtin in standard_builtins() {
            functions.register(builtin);
        }
        functions
    }

    /// Add or replace a builtin.
    pub fn register(&mut self, builtin: Builtin) {
        self.table.insert(builtin.name, builtin);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.table.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Builtin> {
        self.table.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn text(s: impl Into<String>) -> Result<Value, EvalError> {
    Ok(Value::Str(s.into()))
}

fn compile(call: &Call<'_>, idx: usize) -> Result<Regex, EvalError> {
    Regex::new(call.str(idx)?).map_err(|err| call.fail(err))
}

fn split(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let separator = call.str(0)?;
    let subject = call.str(1)?;
    let parts = if separator.is_empty() {
        subject.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        subject.split(separator).map(Value::from).collect()
    };
    Ok(Value::List(parts))
}

fn join(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let separator = call.str(0)?;
    let parts: Vec<String> = match call.arg(1) {
        Value::List(items) => items
            .iter()
            .filter(|item| **item != Value::Nil)
            .map(ToString::to_string)
            .collect(),
        Value::Nil => Vec::new(),
        other => vec![other.to_string()],
    };
    text(parts.join(separator))
}

fn repeat(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let count = usize::try_from(call.int(0)?).map_err(|_| call.fail("negative repeat count"))?;
    let subject = call.str(1)?;
    match subject.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_BYTES => text(subject.repeat(count)),
        _ => Err(call.fail("repeat output too large")),
    }
}

fn regex_find_all(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let re = compile(call, 0)?;
    let subject = call.str(1)?;
    let limit = usize::try_from(call.int(2)?).unwrap_or(usize::MAX);
    Ok(Value::List(
        re.find_iter(subject)
            .take(limit)
            .map(|m| Value::from(m.as_str()))
            .collect(),
    ))
}

/// `$VAR` and `${VAR}` substitution; unset variables expand to nothing.
fn expand_env(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let re = Regex::new(r"\$\{([^}]*)\}|\$([A-Za-z0-9_]+)").map_err(|err| call.fail(err))?;
    let expanded = re.replace_all(call.str(0)?, |caps: &regex::Captures<'_>| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|name| std::env::var(name.as_str()).ok())
            .unwrap_or_default()
    });
    text(expanded)
}

fn uuid_v4(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let mut bytes = [0_u8; 16];
    call.rng().fill_bytes(&mut bytes);
    text(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}

fn b64dec(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let decoded = BASE64.decode(call.str(0)?).map_err(|err| call.fail(err))?;
    String::from_utf8(decoded)
        .map(Value::Str)
        .map_err(|err| call.fail(err))
}

fn default(call: &mut Call<'_>) -> Result<Value, EvalError> {
    match call.args().get(1) {
        Some(given) if !given.is_empty() => Ok(given.clone()),
        _ => Ok(call.arg(0).clone()),
    }
}

fn coalesce(call: &mut Call<'_>) -> Result<Value, EvalError> {
    Ok(call
        .args()
        .iter()
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or(Value::Nil))
}

fn step(call: &Call<'_>, delta: i64) -> Result<Value, EvalError> {
    call.int(0)?
        .checked_add(delta)
        .map(Value::Int)
        .ok_or_else(|| call.fail("integer overflow"))
}

fn rand_int(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let (min, max) = (call.int(0)?, call.int(1)?);
    if min >= max {
        return Err(call.fail(format!("empty range {min}..{max}")));
    }
    Ok(Value::Int(call.rng().gen_range(min..max)))
}

fn has(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let needle = call.arg(0);
    Ok(Value::Bool(call.list(1)?.contains(needle)))
}

fn uniq(call: &mut Call<'_>) -> Result<Value, EvalError> {
    let mut unique: Vec<Value> = Vec::new();
    for item in call.list(0)? {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    Ok(Value::List(unique))
}

#[allow(clippy::too_many_lines)]
fn standard_builtins() -> Vec<Builtin> {
    use Arity::{AtLeast, Exact};

    vec![
        // dates
        Builtin::new(
            "now",
            Exact(0),
            date::now,
            "The current local date and time.",
            r#"now | date "%Y-%m-%d""#,
        ),
        Builtin::new(
            "date",
            Exact(2),
            date::date,
            "Format a date in local time.",
            r#"now | date "%Y-%m-%d""#,
        ),
        Builtin::new(
            "dateInZone",
            Exact(3),
            date::date_in_zone,
            "Format a date in the given zone.",
            r#"dateInZone "%Y-%m-%d" (now) "UTC""#,
        ),
        Builtin::new(
            "dateModify",
            Exact(2),
            date::date_modify,
            "Shift a date by a duration.",
            r#"now | dateModify "-1.5h""#,
        ),
        Builtin::new(
            "duration",
            Exact(1),
            date::duration,
            "Format a number of seconds as a duration.",
            "duration 95",
        ),
        Builtin::new(
            "toDate",
            Exact(2),
            date::to_date,
            "Parse a string into a local date.",
            r#"toDate "%Y-%m-%d" "2017-12-31""#,
        ),
        Builtin::new(
            "unixEpoch",
            Exact(1),
            date::unix_epoch,
            "Seconds since the unix epoch.",
            "now | unixEpoch",
        ),
        // strings
        Builtin::new(
            "trim",
            Exact(1),
            |c| text(c.str(0)?.trim()),
            "Strip surrounding whitespace.",
            r#"trim "   hello    ""#,
        ),
        Builtin::new(
            "trimPrefix",
            Exact(2),
            |c| text(c.str(1)?.strip_prefix(c.str(0)?).unwrap_or(c.str(1)?)),
            "Strip a prefix.",
            r#"trimPrefix "-" "-hello""#,
        ),
        Builtin::new(
            "trimSuffix",
            Exact(2),
            |c| text(c.str(1)?.strip_suffix(c.str(0)?).unwrap_or(c.str(1)?)),
            "Strip a suffix.",
            r#"trimSuffix "-" "hello-""#,
        ),
        Builtin::new(
            "upper",
            Exact(1),
            |c| text(c.str(0)?.to_uppercase()),
            "Convert to upper case.",
            r#"upper "hello""#,
        ),
        Builtin::new(
            "lower",
            Exact(1),
            |c| text(c.str(0)?.to_lowercase()),
            "Convert to lower case.",
            r#"lower "HELLO""#,
        ),
        Builtin::new(
            "title",
            Exact(1),
            |c| text(strings::title(c.str(0)?)),
            "Capitalize every word.",
            r#"title "hello world""#,
        ),
        Builtin::new(
            "repeat",
            Exact(2),
            repeat,
            "Repeat a string.",
            r#"repeat 3 "hello""#,
        ),
        Builtin::new(
            "substr",
            Exact(3),
            |c| text(strings::substr(c.str(2)?, c.int(0)?, c.int(1)?)),
            "Byte range of a string.",
            r#"substr 0 5 "hello world""#,
        ),
        Builtin::new(
            "contains",
            Exact(2),
            |c| Ok(Value::Bool(c.str(1)?.contains(c.str(0)?))),
            "Test for a substring.",
            r#"contains "cat" "catch""#,
        ),
        Builtin::new(
            "hasPrefix",
            Exact(2),
            |c| Ok(Value::Bool(c.str(1)?.starts_with(c.str(0)?))),
            "Test for a prefix.",
            r#"hasPrefix "cat" "catch""#,
        ),
        Builtin::new(
            "hasSuffix",
            Exact(2),
            |c| Ok(Value::Bool(c.str(1)?.ends_with(c.str(0)?))),
            "Test for a suffix.",
            r#"hasSuffix "tch" "catch""#,
        ),
        Builtin::new(
            "split",
            Exact(2),
            split,
            "Split a string into a list.",
            r#"split "$" "foo$bar$baz""#,
        ),
        Builtin::new(
            "join",
            Exact(2),
            join,
            "Join a list with a separator.",
            r#"join "-" .names"#,
        ),
        Builtin::new(
            "replace",
            Exact(3),
            |c| text(c.str(2)?.replace(c.str(0)?, c.str(1)?)),
            "Replace every occurrence.",
            r#""I Am Henry VIII" | replace " " "-""#,
        ),
        Builtin::new(
            "snakecase",
            Exact(1),
            |c| text(strings::snake_case(c.str(0)?)),
            "Convert to snake_case.",
            r#"snakecase "FirstName""#,
        ),
        Builtin::new(
            "kebabcase",
            Exact(1),
            |c| text(strings::kebab_case(c.str(0)?)),
            "Convert to kebab-case.",
            r#"kebabcase "FirstName""#,
        ),
        Builtin::new(
            "camelcase",
            Exact(1),
            |c| text(strings::camel_case(c.str(0)?)),
            "Convert to CamelCase.",
            r#"camelcase "http_server""#,
        ),
        Builtin::new(
            "swapcase",
            Exact(1),
            |c| text(strings::swap_case(c.str(0)?)),
            "Swap the case of every letter.",
            r#"swapcase "Hello""#,
        ),
        // regex
        Builtin::new(
            "regexMatch",
            Exact(2),
            |c| Ok(Value::Bool(compile(c, 0)?.is_match(c.str(1)?))),
            "Test a string against a regular expression.",
            r#"regexMatch "dog$" "bulldog""#,
        ),
        Builtin::new(
            "regexFind",
            Exact(2),
            |c| text(compile(c, 0)?.find(c.str(1)?).map_or("", |m| m.as_str())),
            "First match of a regular expression.",
            r#"regexFind "[a-zA-Z][1-9]" "abcd1234""#,
        ),
        Builtin::new(
            "regexFindAll",
            Exact(3),
            regex_find_all,
            "Up to n matches of a regular expression, all when n is negative.",
            r#"regexFindAll "[2,4,6,8]" "123456789" -1"#,
        ),
        Builtin::new(
            "regexQuoteMeta",
            Exact(1),
            |c| text(regex::escape(c.str(0)?)),
            "Escape regular expression metacharacters.",
            r#"regexQuoteMeta "1.2.3""#,
        ),
        // os
        Builtin::new(
            "env",
            Exact(1),
            |c| text(std::env::var(c.str(0)?).unwrap_or_default()),
            "Read an environment variable.",
            r#"env "HOME""#,
        ),
        Builtin::new(
            "expandenv",
            Exact(1),
            expand_env,
            "Substitute environment variables.",
            r#"expandenv "path is $PATH""#,
        ),
        Builtin::new(
            "pathSep",
            Exact(0),
            |_| text(std::path::MAIN_SEPARATOR.to_string()),
            "The path separator.",
            "pathSep",
        ),
        Builtin::new(
            "pathListSep",
            Exact(0),
            |_| text(if cfg!(windows) { ";" } else { ":" }),
            "The path list separator.",
            "pathListSep",
        ),
        Builtin::new(
            "tempDir",
            Exact(0),
            |_| text(std::env::temp_dir().display().to_string()),
            "The temporary directory.",
            "tempDir",
        ),
        // ids, digests, encoding
        Builtin::new("uuid", Exact(0), uuid_v4, "A random v4 UUID.", "uuid"),
        Builtin::new(
            "sha1sum",
            Exact(1),
            |c| text(hex::encode(Sha1::digest(c.str(0)?.as_bytes()))),
            "Hex SHA-1 digest.",
            r#"sha1sum "Hello world!""#,
        ),
        Builtin::new(
            "sha256sum",
            Exact(1),
            |c| text(hex::encode(Sha256::digest(c.str(0)?.as_bytes()))),
            "Hex SHA-256 digest.",
            r#"sha256sum "Hello world!""#,
        ),
        Builtin::new(
            "b64enc",
            Exact(1),
            |c| text(BASE64.encode(c.str(0)?)),
            "Encode with base64.",
            r#"b64enc "Hello world!""#,
        ),
        Builtin::new(
            "b64dec",
            Exact(1),
            b64dec,
            "Decode base64.",
            r#"b64dec "SGVsbG8gd29ybGQh""#,
        ),
        // defaults
        Builtin::new(
            "default",
            AtLeast(1),
            default,
            "Fallback for an empty value.",
            r#".name | default "foo""#,
        ),
        Builtin::new(
            "coalesce",
            AtLeast(0),
            coalesce,
            "First non-empty argument.",
            r#"coalesce .name .parent.name "Scarlett""#,
        ),
        // numbers
        Builtin::new("incr", Exact(1), |c| step(c, 1), "Add one.", "incr 7"),
        Builtin::new("decr", Exact(1), |c| step(c, -1), "Subtract one.", "decr 9"),
        Builtin::new(
            "rand",
            Exact(2),
            rand_int,
            "Random integer in [min, max).",
            "rand 8 16",
        ),
        // lists
        Builtin::new(
            "has",
            Exact(2),
            has,
            "Test whether a list holds a value.",
            r#".list | has "one""#,
        ),
        Builtin::new(
            "uniq",
            Exact(1),
            uniq,
            "Drop repeated list items.",
            r#"split "$" "a$b$a" | uniq"#,
        ),
    ]
}
