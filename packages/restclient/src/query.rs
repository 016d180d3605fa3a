//! Query-string encoding.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::types::StringMap;

/// Everything except the RFC 3986 unreserved characters is escaped, so a
/// space becomes `%20` rather than `+`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const DEFAULT_PAIR_SEPARATOR: &str = "&";
pub const DEFAULT_KEY_VALUE_SEPARATOR: &str = "=";

/// Encode `parameters` as `k=v&k=v`, preserving insertion order.
///
/// ```rust
/// use restclient::query;
/// use restclient::StringMap;
///
/// let mut params = StringMap::new();
/// params.insert("a".to_string(), "b".to_string());
/// params.insert("c".to_string(), "d e".to_string());
///
/// assert_eq!(query::encode(&params), "a=b&c=d%20e");
/// ```
pub fn encode(parameters: &StringMap) -> String {
    encode_with(parameters, DEFAULT_PAIR_SEPARATOR, DEFAULT_KEY_VALUE_SEPARATOR)
}

/// Encode `parameters` with custom separators.
///
/// Keys and values are escaped independently. A single trailing `pair_sep`
/// is trimmed from the result.
pub fn encode_with(parameters: &StringMap, pair_sep: &str, kv_sep: &str) -> String {
    let mut query = String::new();
    for (key, value) in parameters {
        query.push_str(&escape(key));
        query.push_str(kv_sep);
        query.push_str(&escape(value));
        query.push_str(pair_sep);
    }

    if !pair_sep.is_empty() && query.ends_with(pair_sep) {
        query.truncate(query.len() - pair_sep.len());
    }
    query
}

/// Escape a single query component.
pub fn escape(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT).to_string()
}

/// Split an encoded query string back into its pairs.
///
/// `+` is read as a space, matching form encoding. Pairs without a `=` decode
/// to an empty value; empty segments are skipped.
pub fn decode(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (unescape(key), unescape(value))
        })
        .collect()
}

fn unescape(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_mapping_is_empty_string() {
        assert_eq!(encode(&StringMap::new()), "");
    }

    #[test]
    fn encodes_in_insertion_order() {
        assert_eq!(encode(&params(&[("a", "b"), ("c", "d e")])), "a=b&c=d%20e");
        assert_eq!(encode(&params(&[("c", "d"), ("a", "b")])), "c=d&a=b");
    }

    #[test]
    fn escapes_keys_and_values() {
        assert_eq!(
            encode(&params(&[("q[]", "a&b=c"), ("path", "/x/y?z")])),
            "q%5B%5D=a%26b%3Dc&path=%2Fx%2Fy%3Fz"
        );
    }

    #[test]
    fn leaves_unreserved_characters() {
        assert_eq!(escape("A-z_0.9~"), "A-z_0.9~");
        assert_eq!(escape("ü"), "%C3%BC");
    }

    #[test]
    fn custom_separators() {
        let encoded = encode_with(&params(&[("a", "1"), ("b", "2")]), ";", ":");
        assert_eq!(encoded, "a:1;b:2");
    }

    #[test]
    fn decode_recovers_pairs() {
        let original = params(&[("name", "Jane Doe"), ("tags", "a,b&c"), ("empty", "")]);
        let decoded = decode(&encode(&original));
        let expected: Vec<(String, String)> = original.into_iter().collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn decode_reads_plus_as_space() {
        assert_eq!(
            decode("q=hello+world&flag"),
            vec![
                ("q".to_string(), "hello world".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }
}
