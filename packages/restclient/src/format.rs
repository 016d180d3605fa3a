//! Choosing the decoding format for a response.

use lazy_static::lazy_static;
use regex::Regex;

use crate::headers::ParsedHeaders;
use crate::{Error, Result};

/// Matches `type/subtype` with an optional `;parameters` suffix.
pub const DEFAULT_FORMAT_PATTERN: &str = r"(\w+)/(\w+)(;.+)?";

lazy_static! {
    pub static ref DEFAULT_FORMAT_REGEX: Regex = Regex::new(DEFAULT_FORMAT_PATTERN).unwrap();
}

/// Check that `pattern` has the two capture groups format detection reads.
pub fn validate_pattern(pattern: &Regex) -> Result<()> {
    // captures_len counts the implicit whole-match group
    if pattern.captures_len() < 3 {
        return Err(Error::InvalidFormatPattern {
            message: format!(
                "'{}' needs at least two capture groups (type and subtype)",
                pattern.as_str()
            ),
        });
    }
    Ok(())
}

/// Resolves the format of a response body.
///
/// An explicitly configured format always wins. Otherwise the second capture
/// group of `pattern`, matched against the `Content-Type` header, names the
/// format.
#[derive(Debug, Clone, Copy)]
pub struct FormatResolver<'a> {
    format: Option<&'a str>,
    pattern: &'a Regex,
}

impl<'a> FormatResolver<'a> {
    pub fn new(format: Option<&'a str>, pattern: &'a Regex) -> Self {
        Self { format, pattern }
    }

    /// # Errors
    ///
    /// - [`Error::NoResponse`] if `body` is empty
    /// - [`Error::UndeterminedFormat`] if no format is configured and the
    ///   content type is missing or does not match
    pub fn resolve(&self, headers: &ParsedHeaders, body: &str) -> Result<String> {
        if body.is_empty() {
            return Err(Error::NoResponse);
        }

        if let Some(format) = self.format.filter(|f| !f.is_empty()) {
            return Ok(format.to_string());
        }

        // A repeated Content-Type resolves on the last one received.
        let content_type = headers
            .get("content_type")
            .map(|value| value.last())
            .filter(|value| !value.is_empty())
            .ok_or(Error::UndeterminedFormat)?;

        self.pattern
            .captures(content_type)
            .and_then(|captures| captures.get(2))
            .map(|subtype| subtype.as_str().to_string())
            .ok_or(Error::UndeterminedFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(content_type: Option<&str>) -> ParsedHeaders {
        let mut headers = ParsedHeaders::new();
        if let Some(content_type) = content_type {
            headers.append("Content-Type", content_type);
        }
        headers
    }

    #[test]
    fn configured_format_wins_over_header() {
        let resolver = FormatResolver::new(Some("json"), &DEFAULT_FORMAT_REGEX);
        let format = resolver.resolve(&headers(Some("application/xml")), "<a/>").unwrap();
        assert_eq!(format, "json");
    }

    #[test]
    fn subtype_from_content_type() {
        let resolver = FormatResolver::new(None, &DEFAULT_FORMAT_REGEX);
        let format = resolver.resolve(&headers(Some("application/xml")), "<a/>").unwrap();
        assert_eq!(format, "xml");
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let resolver = FormatResolver::new(None, &DEFAULT_FORMAT_REGEX);
        let format = resolver
            .resolve(&headers(Some("application/json; charset=utf-8")), "{}")
            .unwrap();
        assert_eq!(format, "json");
    }

    #[test]
    fn missing_header_is_undetermined() {
        let resolver = FormatResolver::new(None, &DEFAULT_FORMAT_REGEX);
        let err = resolver.resolve(&headers(None), "{}").unwrap_err();
        assert!(matches!(err, Error::UndeterminedFormat));
    }

    #[test]
    fn unmatched_header_is_undetermined() {
        let resolver = FormatResolver::new(None, &DEFAULT_FORMAT_REGEX);
        let err = resolver.resolve(&headers(Some("garbage")), "{}").unwrap_err();
        assert!(matches!(err, Error::UndeterminedFormat));
    }

    #[test]
    fn empty_body_is_no_response() {
        let resolver = FormatResolver::new(Some("json"), &DEFAULT_FORMAT_REGEX);
        let err = resolver.resolve(&headers(Some("application/json")), "").unwrap_err();
        assert!(matches!(err, Error::NoResponse));
    }

    #[test]
    fn empty_configured_format_falls_back_to_header() {
        let resolver = FormatResolver::new(Some(""), &DEFAULT_FORMAT_REGEX);
        let format = resolver.resolve(&headers(Some("text/csv")), "a,b").unwrap();
        assert_eq!(format, "csv");
    }

    #[test]
    fn custom_pattern() {
        let pattern = Regex::new(r"(\w+)/vnd\.example\.(\w+)").unwrap();
        let resolver = FormatResolver::new(None, &pattern);
        let format = resolver
            .resolve(&headers(Some("application/vnd.example.yaml")), "a: 1")
            .unwrap();
        assert_eq!(format, "yaml");
    }

    #[test]
    fn validate_pattern_requires_two_groups() {
        assert!(validate_pattern(&DEFAULT_FORMAT_REGEX).is_ok());
        let err = validate_pattern(&Regex::new(r"\w+/(\w+)").unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormatPattern { .. }));
    }
}
