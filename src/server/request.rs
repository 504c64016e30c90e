use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use tracing::debug;

/// Query parameters: key to values in order of appearance.
pub type QueryParams = HashMap<String, Vec<String>>;

/// Request data the dispatcher needs, extracted from the wire request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// HTTP method
    pub method: Method,
    /// Raw request target, including query string
    pub uri: String,
    /// Normalized path segments
    pub segments: Vec<String>,
    /// Parsed query string
    pub query: QueryParams,
}

impl ParsedRequest {
    /// Normalize `uri` and parse its query string.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            segments: normalize_path(uri),
            query: parse_query(uri),
            method,
            uri: uri.to_string(),
        }
    }
}

/// Split a request target into lower-cased, non-empty path segments.
///
/// Everything from the first `?` or `#` on is ignored. Segments are not
/// percent-decoded.
///
/// ```rust
/// use segroute::server::normalize_path;
///
/// assert_eq!(normalize_path("//Users/42/?x=1"), vec!["users", "42"]);
/// assert!(normalize_path("/").is_empty());
/// ```
#[must_use]
pub fn normalize_path(uri: &str) -> Vec<String> {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Parse the query string of a request target.
///
/// Pairs are separated by `&` or `;`. Each pair splits on its first `=`; a pair
/// without `=` yields an empty value. Keys and values are form-decoded.
/// Repeated keys accumulate in order.
#[must_use]
pub fn parse_query(uri: &str) -> QueryParams {
    let mut query = QueryParams::new();
    let Some((_, trailer)) = uri.split_once('?') else {
        return query;
    };
    let raw = trailer.split('#').next().unwrap_or_default();
    for piece in raw.split(['&', ';']).filter(|p| !p.is_empty()) {
        for (key, value) in url::form_urlencoded::parse(piece.as_bytes()) {
            query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    query
}

/// Extract method and request target from a `may_minihttp::Request`.
///
/// A method that is not a valid token becomes the extension method
/// `UNKNOWN`, which only `ANY` filters serve.
pub fn parse_request(req: &Request) -> ParsedRequest {
    let method = Method::from_bytes(req.method().as_bytes()).unwrap_or_else(|_| unknown_method());
    let parsed = ParsedRequest::new(method, req.path());
    debug!(
        method = %parsed.method,
        uri = %parsed.uri,
        segments = parsed.segments.len(),
        query_keys = parsed.query.len(),
        "HTTP request parsed"
    );
    parsed
}

fn unknown_method() -> Method {
    Method::from_bytes(b"UNKNOWN").unwrap_or(Method::GET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Hi"), vec!["hi"]);
        assert_eq!(normalize_path("/a//b/"), vec!["a", "b"]);
        assert_eq!(normalize_path("/a/b#frag/c"), vec!["a", "b"]);
        assert_eq!(normalize_path("/a%20b"), vec!["a%20b"]);
        assert!(normalize_path("").is_empty());
        assert!(normalize_path("?x=1").is_empty());
    }

    #[test]
    fn test_parse_query_accumulates() {
        let q = parse_query("/p?tag=a&tag=b;x=1&flag#frag");
        assert_eq!(q.get("tag"), Some(&vec!["a".to_string(), "b".to_string()]));
        assert_eq!(q.get("x"), Some(&vec!["1".to_string()]));
        assert_eq!(q.get("flag"), Some(&vec![String::new()]));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_parse_query_decodes_and_splits_on_first_equals() {
        let q = parse_query("/p?name=a%20b+c&eq=x=y");
        assert_eq!(q["name"], vec!["a b c"]);
        assert_eq!(q["eq"], vec!["x=y"]);
    }

    #[test]
    fn test_parse_query_without_query_string() {
        assert!(parse_query("/p").is_empty());
        assert!(parse_query("/p?").is_empty());
    }
}
