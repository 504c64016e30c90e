//! Dispatcher core: turns matched routes into ordered filter invocations.

use crate::filter::{Capability, Filter};
use crate::router::{Captures, Router};
use crate::server::{ParsedRequest, QueryParams, ResponseSink};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Request data handed to every filter.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// HTTP method of the request
    pub method: &'a Method,
    /// Raw request target as received
    pub uri: &'a str,
    /// Normalized, lower-cased path segments
    pub path: &'a [String],
    /// Captures of the current route; unnamed ones under `_1`, `_2`, ...
    pub fields: HashMap<String, String>,
    /// Query parameters, shared by every route tried for this request
    pub query: &'a QueryParams,
}

impl RequestContext<'_> {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a query parameter, in order of appearance.
    #[must_use]
    pub fn query_all(&self, key: &str) -> &[String] {
        self.query.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A filter returned `over = true` while handling candidate `route`.
    Completed { route: usize },
    /// Candidates existed but none finished the request; not-found was written.
    FellThrough { candidates: usize },
    /// No route matched; not-found was written.
    NotFound,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }
}

/// Build the field map for one candidate route.
///
/// Unnamed captures get synthetic keys `_1`, `_2`, ... counted per route.
/// When a name repeats, the later capture wins.
#[must_use]
pub fn field_map(captures: &Captures<'_, '_>) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(captures.len());
    let mut unnamed = 0usize;
    for (name, value) in captures {
        let key = if name.is_empty() {
            unnamed += 1;
            format!("_{unnamed}")
        } else {
            (*name).to_string()
        };
        fields.insert(key, (*value).to_string());
    }
    fields
}

/// Run one route's filter list. Returns `(ok, over)`.
///
/// An `ANY` filter runs and ends the scan whatever it returns. A filter
/// implementing the request's method runs and sets `ok`; `over = true` ends
/// the scan at once. Other filters are skipped.
pub fn apply_filters(
    filters: &[Filter],
    capability: Option<Capability>,
    ctx: &RequestContext<'_>,
    out: &mut dyn ResponseSink,
) -> (bool, bool) {
    let mut ok = false;
    for (index, filter) in filters.iter().enumerate() {
        if let Some(handler) = filter.handler(Capability::Any) {
            let over = handler(ctx, out);
            trace!(filter = index, capability = "ANY", over, "Filter invoked");
            return (true, over);
        }
        let Some(handler) = capability.and_then(|cap| filter.handler(cap)) else {
            continue;
        };
        let over = handler(ctx, out);
        trace!(filter = index, capability = ?capability, over, "Filter invoked");
        ok = true;
        if over {
            return (true, true);
        }
    }
    (ok, false)
}

/// Dispatches requests against a shared, read-only [`Router`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Normalize `uri`, then dispatch.
    pub fn dispatch(&self, method: &Method, uri: &str, out: &mut dyn ResponseSink) -> DispatchOutcome {
        let request = ParsedRequest::new(method.clone(), uri);
        self.dispatch_parsed(&request, out)
    }

    /// Try every candidate route in order until a filter returns `over = true`.
    ///
    /// Falls back to the router's not-found responder when nothing matches or
    /// when every candidate has been tried without finishing the request. Writes
    /// made by filters that returned `over = false` stay in `out`.
    pub fn dispatch_parsed(&self, request: &ParsedRequest, out: &mut dyn ResponseSink) -> DispatchOutcome {
        let routes = self.router.match_path(&request.segments);
        if routes.is_empty() {
            debug!(method = %request.method, uri = %request.uri, "No route matched");
            self.router.not_found(out);
            return DispatchOutcome::NotFound;
        }

        let capability = Capability::from_method(&request.method);
        for (index, route) in routes.iter().enumerate() {
            let ctx = RequestContext {
                method: &request.method,
                uri: &request.uri,
                path: &request.segments,
                fields: field_map(&route.captures),
                query: &request.query,
            };
            let (ok, over) = apply_filters(route.filters, capability, &ctx, out);
            if ok && over {
                debug!(
                    method = %request.method,
                    uri = %request.uri,
                    candidates = routes.len(),
                    route = index,
                    "Request handled"
                );
                return DispatchOutcome::Completed { route: index };
            }
        }

        debug!(
            method = %request.method,
            uri = %request.uri,
            candidates = routes.len(),
            "No filter completed the request"
        );
        self.router.not_found(out);
        DispatchOutcome::FellThrough {
            candidates: routes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::BufferedResponse;
    use http::StatusCode;
    use smallvec::smallvec;
    use std::sync::Mutex;

    #[test]
    fn test_field_map_synthetic_keys() {
        let captures: Captures<'_, '_> = smallvec![("", "x"), ("id", "7"), ("", "y")];
        let fields = field_map(&captures);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["_1"], "x");
        assert_eq!(fields["_2"], "y");
        assert_eq!(fields["id"], "7");
    }

    #[test]
    fn test_field_map_later_duplicate_wins() {
        let captures: Captures<'_, '_> = smallvec![("id", "1"), ("id", "2")];
        assert_eq!(field_map(&captures)["id"], "2");
    }

    fn context<'a>(method: &'a Method, query: &'a QueryParams) -> RequestContext<'a> {
        RequestContext {
            method,
            uri: "/",
            path: &[],
            fields: HashMap::new(),
            query,
        }
    }

    #[test]
    fn test_any_filter_ends_scan_even_when_not_over() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::clone(&calls);
        let b = Arc::clone(&calls);
        let filters = vec![
            Filter::single(Capability::Any, move |_, _| {
                a.lock().unwrap().push("any");
                false
            }),
            Filter::single(Capability::Get, move |_, _| {
                b.lock().unwrap().push("get");
                true
            }),
        ];
        let query = QueryParams::new();
        let method = Method::GET;
        let ctx = context(&method, &query);
        let mut out = BufferedResponse::new();
        let result = apply_filters(&filters, Some(Capability::Get), &ctx, &mut out);
        assert_eq!(result, (true, false));
        assert_eq!(*calls.lock().unwrap(), vec!["any"]);
    }

    #[test]
    fn test_method_filters_run_until_over() {
        let filters = vec![
            Filter::single(Capability::Post, |_, out| {
                out.write(b"a");
                false
            }),
            Filter::single(Capability::Get, |_, out| {
                out.write(b"skipped");
                true
            }),
            Filter::single(Capability::Post, |_, out| {
                out.write(b"b");
                true
            }),
            Filter::single(Capability::Post, |_, out| {
                out.write(b"never");
                true
            }),
        ];
        let query = QueryParams::new();
        let method = Method::POST;
        let ctx = context(&method, &query);
        let mut out = BufferedResponse::new();
        let result = apply_filters(&filters, Some(Capability::Post), &ctx, &mut out);
        assert_eq!(result, (true, true));
        assert_eq!(out.body_str(), "ab");
    }

    #[test]
    fn test_unmatched_method_is_not_ok() {
        let filters = vec![Filter::single(Capability::Get, |_, _| true)];
        let query = QueryParams::new();
        let method = Method::DELETE;
        let ctx = context(&method, &query);
        let mut out = BufferedResponse::new();
        let result = apply_filters(&filters, Some(Capability::Delete), &ctx, &mut out);
        assert_eq!(result, (false, false));
        assert_eq!(out.status(), StatusCode::OK);
        assert!(out.body().is_empty());
    }

    #[test]
    fn test_extension_method_reaches_only_any() {
        let mut router = Router::new();
        router.get("/x", |_, out| {
            out.ok(b"get");
            true
        });
        router.any("/x", |ctx, out| {
            out.ok(ctx.method.as_str().as_bytes());
            true
        });
        let dispatcher = Dispatcher::new(Arc::new(router));
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut out = BufferedResponse::new();
        let outcome = dispatcher.dispatch(&purge, "/x", &mut out);
        assert_eq!(outcome, DispatchOutcome::Completed { route: 0 });
        assert_eq!(out.body_str(), "PURGE");
    }

    #[test]
    fn test_context_query_helpers() {
        let mut query = QueryParams::new();
        query.insert("tag".into(), vec!["a".into(), "b".into()]);
        let method = Method::GET;
        let ctx = context(&method, &query);
        assert_eq!(ctx.query_first("tag"), Some("a"));
        assert_eq!(ctx.query_all("tag").len(), 2);
        assert!(ctx.query_all("none").is_empty());
        assert_eq!(ctx.field("missing"), None);
    }
}
