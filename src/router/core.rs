//! Router core: registration API and read-only matching over the segment tree.

use super::segment::{compile_pattern, compile_pattern_lenient, PatternError, Segment};
use super::tree::{MatchedRoute, RoutingNode};
use crate::dispatcher::RequestContext;
use crate::filter::{Capability, Filter, NotFoundFn};
use crate::server::{write_method_not_allowed, write_not_found, ResponseSink};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Matches slower than this are logged at `warn`.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// One call to a registration method, kept for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The pattern as given by the caller
    pub pattern: String,
    /// Capabilities implemented by the registered filter
    pub capabilities: Vec<Capability>,
}

/// Routing tree plus the not-found responder.
///
/// Build it single-threaded, then share it read-only (typically behind an
/// `Arc`) with the serving side. Nothing in the router mutates during matching.
///
/// ```rust
/// use segroute::router::Router;
///
/// let mut router = Router::new();
/// router
///     .get("/users/:id(\\d+)", |ctx, out| {
///         let id = ctx.field("id").unwrap_or_default();
///         out.ok(format!("user {id}").as_bytes());
///         true
///     })
///     .get("/files/*", |_ctx, out| {
///         out.ok(b"file");
///         true
///     });
///
/// let routes = router.match_path(&["users", "42"]);
/// assert_eq!(routes.len(), 1);
/// assert_eq!(routes[0].capture("id"), Some("42"));
/// ```
#[derive(Clone)]
pub struct Router {
    root: RoutingNode,
    not_found: NotFoundFn,
    registrations: Vec<Registration>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.root)
            .field("registrations", &self.registrations)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// An empty router whose not-found responder writes `404 Not Found`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RoutingNode::root(),
            not_found: Arc::new(write_not_found),
            registrations: Vec::new(),
        }
    }

    /// Register `filter` under `pattern`.
    ///
    /// Malformed regex constraints are dropped with a warning and the segment
    /// matches without a constraint. Use [`Router::try_filter`] to reject them.
    pub fn filter(&mut self, pattern: &str, filter: Filter) -> &mut Self {
        let segments = compile_pattern_lenient(pattern);
        self.insert(pattern, &segments, filter);
        self
    }

    /// Register `filter` under `pattern`, rejecting malformed constraints.
    ///
    /// The tree is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an empty, unterminated or invalid constraint.
    pub fn try_filter(&mut self, pattern: &str, filter: Filter) -> Result<&mut Self, PatternError> {
        let segments = compile_pattern(pattern)?;
        self.insert(pattern, &segments, filter);
        Ok(self)
    }

    /// Register a single-capability handler.
    pub fn register<F>(&mut self, capability: Capability, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.filter(pattern, Filter::single(capability, handler))
    }

    /// Strict form of [`Router::register`].
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an empty, unterminated or invalid constraint.
    pub fn try_register<F>(
        &mut self,
        capability: Capability,
        pattern: &str,
        handler: F,
    ) -> Result<&mut Self, PatternError>
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.try_filter(pattern, Filter::single(capability, handler))
    }

    /// Handler for every method. Ends the scan of its route whatever it returns.
    pub fn any<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Any, pattern, handler)
    }

    pub fn options<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Options, pattern, handler)
    }

    pub fn head<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Head, pattern, handler)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Get, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Post, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Put, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Patch, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Delete, pattern, handler)
    }

    pub fn trace<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Trace, pattern, handler)
    }

    pub fn connect<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.register(Capability::Connect, pattern, handler)
    }

    /// Replace the not-found responder.
    pub fn set_not_found<F>(&mut self, responder: F) -> &mut Self
    where
        F: Fn(&mut dyn ResponseSink) + Send + Sync + 'static,
    {
        self.not_found = Arc::new(responder);
        self
    }

    fn insert(&mut self, pattern: &str, segments: &[Segment], filter: Filter) {
        let capabilities: Vec<Capability> = filter.capabilities().collect();
        debug!(
            pattern = %pattern,
            segments = segments.len(),
            capabilities = ?capabilities,
            "Registering route"
        );
        self.root.insert(segments, filter);
        self.registrations.push(Registration {
            pattern: pattern.to_string(),
            capabilities,
        });
    }

    /// Every route `path` matches, in registration order.
    ///
    /// `path` must already be normalized: lower-cased with empty segments removed.
    #[must_use]
    pub fn match_path<'r, 'p, S: AsRef<str>>(&'r self, path: &'p [S]) -> Vec<MatchedRoute<'r, 'p>> {
        let started = Instant::now();
        let routes = self.root.match_path(path);
        let elapsed = started.elapsed();
        if elapsed > SLOW_MATCH {
            warn!(
                depth = path.len(),
                candidates = routes.len(),
                duration_us = elapsed.as_micros(),
                "Slow route matching detected"
            );
        }
        routes
    }

    /// Invoke the not-found responder.
    pub fn not_found(&self, out: &mut dyn ResponseSink) {
        (self.not_found)(out);
    }

    /// Write `405 Method Not Allowed`. Never invoked by dispatch on its own;
    /// filters call it when they want to refuse a method.
    pub fn method_not_allowed(out: &mut dyn ResponseSink) {
        write_method_not_allowed(out);
    }

    /// The tree root, for inspection.
    #[must_use]
    pub fn root(&self) -> &RoutingNode {
        &self.root
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.registrations.len()
    }

    /// Registrations in the order they were made.
    #[must_use]
    pub fn patterns(&self) -> &[Registration] {
        &self.registrations
    }

    /// Render the routing tree as indented text.
    #[must_use]
    pub fn render_tree(&self) -> String {
        let mut buf = String::new();
        self.root.render(0, &mut buf);
        buf
    }

    /// Print registrations and the tree to stdout.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.registrations.len());
        for registration in &self.registrations {
            let caps: Vec<&str> = registration.capabilities.iter().map(|c| c.as_str()).collect();
            println!("[route] {} -> {}", caps.join(","), registration.pattern);
        }
        print!("{}", self.render_tree());
    }

    /// Log a summary of the routing table at `info`.
    pub fn log_summary(&self) {
        let summary: Vec<String> = self
            .registrations
            .iter()
            .take(10)
            .map(|r| format!("{:?} {}", r.capabilities, r.pattern))
            .collect();
        info!(
            routes_count = self.registrations.len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
    }
}
