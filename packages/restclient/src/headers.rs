//! Parsing of raw response header blocks.
//!
//! Executors hand back the status line, header lines and body as one stream.
//! [`parse`] splits that stream at the first blank line and folds the header
//! lines into [`ParsedHeaders`].

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;

/// A header's value: a single string, or every value in encounter order when
/// the name was repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(value) => value,
            HeaderValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn last(&self) -> &str {
        match self {
            HeaderValue::Single(value) => value,
            HeaderValue::Multiple(values) => values.last().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multiple(values) => values,
        };
        values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Single(_) => 1,
            HeaderValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(first) => {
                *self = HeaderValue::Multiple(vec![std::mem::take(first), value]);
            }
            HeaderValue::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

/// Response headers keyed by normalised name.
///
/// Names are lower-cased with `-` replaced by `_`, so `Content-Type` is stored
/// as `content_type`. Lookups normalise their argument the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedHeaders(IndexMap<String, HeaderValue>);

impl ParsedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one header occurrence.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(normalize_name(name)) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
            Entry::Vacant(entry) => {
                entry.insert(HeaderValue::Single(value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The pieces of a raw executor output stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParts {
    pub status_line: String,
    pub headers: ParsedHeaders,
    pub body: String,
}

/// Lower-case a header name and replace `-` with `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

/// Split `raw` into status line, headers and body.
///
/// The first line is the status line. Header lines follow until the first
/// blank line; everything after that line is the body. Header lines are split
/// on their first colon, and lines without a colon are skipped. Both `\r\n`
/// and `\n` line endings are accepted.
pub fn parse(raw: &str) -> RawParts {
    let (status_line, mut remainder) = next_line(raw);
    let mut headers = ParsedHeaders::new();
    let mut body = "";

    while !remainder.is_empty() {
        let (line, after) = next_line(remainder);
        remainder = after;

        if line.trim().is_empty() {
            body = remainder;
            break;
        }

        if let Some((name, value)) = line.split_once(':') {
            headers.append(name, value.trim());
        }
    }

    RawParts {
        status_line: status_line.to_string(),
        headers,
        body: body.to_string(),
    }
}

fn next_line(input: &str) -> (&str, &str) {
    match input.split_once('\n') {
        Some((line, rest)) => (line.strip_suffix('\r').unwrap_or(line), rest),
        None => (input.strip_suffix('\r').unwrap_or(input), ""),
    }
}
