//! # Filters
//!
//! A [`Filter`] is the handler registered against a pattern. It carries one
//! optional handler slot per [`Capability`]: the nine HTTP methods plus `ANY`.
//! A filter usually fills one slot; filling several lets a single
//! registration answer more than one method.
//!
//! Every handler receives the request context and a response sink, and
//! returns `over`: `true` when the request is fully handled and dispatch must
//! stop.
//!
//! ```rust
//! use segroute::filter::{Capability, Filter};
//!
//! let filter = Filter::new()
//!     .with(Capability::Get, |_ctx, out| {
//!         out.ok(b"listing");
//!         true
//!     })
//!     .with(Capability::Post, |_ctx, out| {
//!         out.ok(b"created");
//!         true
//!     });
//! assert!(filter.implements(Capability::Get));
//! assert!(!filter.implements(Capability::Any));
//! ```

use crate::dispatcher::RequestContext;
use crate::server::ResponseSink;
use http::Method;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Handler invoked for a matched request. Returns `over`.
pub type FilterFn = Arc<dyn Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync>;

/// Responder invoked when dispatch finds nothing that completes the request.
pub type NotFoundFn = Arc<dyn Fn(&mut dyn ResponseSink) + Send + Sync>;

const CAPABILITY_COUNT: usize = 10;

/// The per-method handler slots a filter may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Any,
    Options,
    Head,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Trace,
    Connect,
}

impl Capability {
    /// All capabilities, `Any` first.
    pub const ALL: [Capability; CAPABILITY_COUNT] = [
        Capability::Any,
        Capability::Options,
        Capability::Head,
        Capability::Get,
        Capability::Post,
        Capability::Put,
        Capability::Patch,
        Capability::Delete,
        Capability::Trace,
        Capability::Connect,
    ];

    /// The capability that serves `method`, or `None` for extension methods.
    ///
    /// Never returns `Any`: that slot is consulted for every method.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::OPTIONS => Some(Capability::Options),
            Method::HEAD => Some(Capability::Head),
            Method::GET => Some(Capability::Get),
            Method::POST => Some(Capability::Post),
            Method::PUT => Some(Capability::Put),
            Method::PATCH => Some(Capability::Patch),
            Method::DELETE => Some(Capability::Delete),
            Method::TRACE => Some(Capability::Trace),
            Method::CONNECT => Some(Capability::Connect),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Any => "ANY",
            Capability::Options => "OPTIONS",
            Capability::Head => "HEAD",
            Capability::Get => "GET",
            Capability::Post => "POST",
            Capability::Put => "PUT",
            Capability::Patch => "PATCH",
            Capability::Delete => "DELETE",
            Capability::Trace => "TRACE",
            Capability::Connect => "CONNECT",
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is neither one of the nine methods nor `ANY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown method '{}': expected ANY, OPTIONS, HEAD, GET, POST, PUT, PATCH, DELETE, TRACE or CONNECT",
            self.0
        )
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for Capability {
    type Err = UnknownCapability;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// A registered handler with one optional slot per capability.
///
/// Cloning is cheap: slots are reference counted. Filters are shared across
/// concurrently served requests and must not rely on unsynchronized mutable state.
#[derive(Clone, Default)]
pub struct Filter {
    slots: [Option<FilterFn>; CAPABILITY_COUNT],
}

impl Filter {
    /// A filter with no slots filled. It matches but never runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter implementing exactly one capability.
    #[must_use]
    pub fn single<F>(capability: Capability, handler: F) -> Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        Self::new().with(capability, handler)
    }

    /// Fill (or replace) the slot for `capability`.
    #[must_use]
    pub fn with<F>(mut self, capability: Capability, handler: F) -> Self
    where
        F: Fn(&RequestContext<'_>, &mut dyn ResponseSink) -> bool + Send + Sync + 'static,
    {
        self.slots[capability.slot()] = Some(Arc::new(handler));
        self
    }

    /// Fill the slot with an already shared handler.
    #[must_use]
    pub fn with_shared(mut self, capability: Capability, handler: FilterFn) -> Self {
        self.slots[capability.slot()] = Some(handler);
        self
    }

    #[inline]
    #[must_use]
    pub fn handler(&self, capability: Capability) -> Option<&FilterFn> {
        self.slots[capability.slot()].as_ref()
    }

    #[inline]
    #[must_use]
    pub fn implements(&self, capability: Capability) -> bool {
        self.slots[capability.slot()].is_some()
    }

    /// Filled slots in [`Capability::ALL`] order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.implements(*cap))
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.capabilities()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_method_covers_all_nine() {
        let methods = [
            (Method::OPTIONS, Capability::Options),
            (Method::HEAD, Capability::Head),
            (Method::GET, Capability::Get),
            (Method::POST, Capability::Post),
            (Method::PUT, Capability::Put),
            (Method::PATCH, Capability::Patch),
            (Method::DELETE, Capability::Delete),
            (Method::TRACE, Capability::Trace),
            (Method::CONNECT, Capability::Connect),
        ];
        for (method, cap) in methods {
            assert_eq!(Capability::from_method(&method), Some(cap));
        }
        let purge = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(Capability::from_method(&purge), None);
    }

    #[test]
    fn test_capability_parse_is_case_insensitive() {
        assert_eq!("any".parse::<Capability>().unwrap(), Capability::Any);
        assert_eq!("Patch".parse::<Capability>().unwrap(), Capability::Patch);
        let err = "FETCH".parse::<Capability>().unwrap_err();
        assert_eq!(err, UnknownCapability("FETCH".into()));
    }

    #[test]
    fn test_filter_slots() {
        let filter = Filter::single(Capability::Put, |_, _| true).with(Capability::Delete, |_, _| false);
        assert!(filter.implements(Capability::Put));
        assert!(filter.implements(Capability::Delete));
        assert!(!filter.implements(Capability::Get));
        assert!(filter.handler(Capability::Any).is_none());
        let caps: Vec<_> = filter.capabilities().collect();
        assert_eq!(caps, vec![Capability::Put, Capability::Delete]);
        assert_eq!(format!("{filter:?}"), "[Put, Delete]");
    }
}
