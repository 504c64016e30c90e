//! # Dispatcher Module
//!
//! The dispatcher turns a request into ordered filter invocations over the
//! candidate routes the router returns.
//!
//! ## Request Flow
//!
//! 1. The request target is normalized into lower-cased path segments and its
//!    query string is parsed ([`crate::server::ParsedRequest`])
//! 2. The router enumerates every candidate route for the path
//! 3. For each candidate, in order, a [`RequestContext`] is built from its
//!    captures and the route's filters are applied
//! 4. The first filter returning `over = true` ends the request
//! 5. Otherwise the router's not-found responder is invoked
//!
//! ## Filter Precedence
//!
//! Within one route's filter list:
//! - an `ANY` filter runs and ends that route's scan, whether or not it is `over`
//! - a filter implementing the request's method runs; `over = true` ends dispatch
//! - every other filter is skipped
//!
//! A route whose filters all returned `over = false` hands over to the next
//! candidate route.
//!
//! ## Example
//!
//! ```rust
//! use segroute::dispatcher::{DispatchOutcome, Dispatcher};
//! use segroute::router::Router;
//! use segroute::server::BufferedResponse;
//! use http::{Method, StatusCode};
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.get("/hi", |_ctx, out| {
//!     out.ok(b"hello");
//!     true
//! });
//! let dispatcher = Dispatcher::new(Arc::new(router));
//!
//! let mut out = BufferedResponse::new();
//! let outcome = dispatcher.dispatch(&Method::GET, "/hi", &mut out);
//! assert!(outcome.is_completed());
//! assert_eq!(out.body_str(), "hello");
//!
//! let mut out = BufferedResponse::new();
//! assert_eq!(dispatcher.dispatch(&Method::GET, "/missing", &mut out), DispatchOutcome::NotFound);
//! assert_eq!(out.status(), StatusCode::NOT_FOUND);
//! ```

mod core;

pub use core::{apply_filters, field_map, DispatchOutcome, Dispatcher, RequestContext};
