use http::StatusCode;
use may_minihttp::Response;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Maximum inline response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 8;

/// Distinct header lines a [`HeaderLines`] set will hold.
pub const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// Response header storage.
pub type HeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// Where filters write their response.
///
/// `write` may be called several times; bytes accumulate in call order.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    /// Add or replace a header (case-insensitive name).
    fn set_header(&mut self, name: &str, value: &str);

    fn write(&mut self, body: &[u8]);

    /// Set the status, then write the body.
    fn return_status(&mut self, status: StatusCode, body: &[u8]) {
        self.set_status(status);
        self.write(body);
    }

    /// `200 OK` with `body`.
    fn ok(&mut self, body: &[u8]) {
        self.return_status(StatusCode::OK, body);
    }
}

/// In-memory response. The serving adapter copies it to the wire once
/// dispatch returns; tests inspect it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    /// Empty body, status `200 OK`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Copy status, headers and body into a `may_minihttp` response.
    ///
    /// Header lines go through `lines`; a header the set refuses is dropped.
    pub fn write_to(self, res: &mut Response, lines: &HeaderLines) {
        res.status_code(usize::from(self.status.as_u16()), reason_phrase(self.status));
        for (name, value) in &self.headers {
            if let Some(line) = lines.intern(name, value) {
                res.header(line);
            }
        }
        res.body_vec(self.body);
    }
}

/// Shared set of `name: value` header lines with `'static` lifetime.
///
/// `may_minihttp` only accepts `&'static str` header lines. Each distinct line
/// is leaked once and reused by every later response, so memory is bounded by
/// the number of distinct lines, capped at [`MAX_INTERNED_HEADER_LINES`] by
/// default.
#[derive(Debug, Clone)]
pub struct HeaderLines {
    lines: Arc<RwLock<HashSet<&'static str>>>,
    limit: usize,
}

impl Default for HeaderLines {
    fn default() -> Self {
        Self::with_limit(MAX_INTERNED_HEADER_LINES)
    }
}

impl HeaderLines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding at most `limit` distinct lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            lines: Arc::new(RwLock::new(HashSet::new())),
            limit,
        }
    }

    /// The interned line for `name: value`, or `None` once the set is full.
    #[must_use]
    pub fn intern(&self, name: &str, value: &str) -> Option<&'static str> {
        let line = format!("{name}: {value}");
        {
            let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(interned) = lines.get(line.as_str()) {
                return Some(*interned);
            }
        }

        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(interned) = lines.get(line.as_str()) {
            return Some(*interned);
        }
        if lines.len() >= self.limit {
            warn!(
                header = %name,
                limit = self.limit,
                "Header line dropped: too many distinct header lines"
            );
            return None;
        }
        let interned: &'static str = Box::leak(line.into_boxed_str());
        lines.insert(interned);
        Some(interned)
    }

    /// Number of distinct lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }
}

/// Standard reason phrase, `"Unknown"` for unregistered codes.
#[must_use]
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// `404` with its reason phrase as body.
pub fn write_not_found(out: &mut dyn ResponseSink) {
    out.return_status(
        StatusCode::NOT_FOUND,
        reason_phrase(StatusCode::NOT_FOUND).as_bytes(),
    );
}

/// `405` with its reason phrase as body.
pub fn write_method_not_allowed(out: &mut dyn ResponseSink) {
    out.return_status(
        StatusCode::METHOD_NOT_ALLOWED,
        reason_phrase(StatusCode::METHOD_NOT_ALLOWED).as_bytes(),
    );
}
