//! # segroute
//!
//! **segroute** is a URL router built on a segment tree. Patterns mix literal
//! segments, named captures, optional captures, wildcards and regular-expression
//! constraints; each registration carries a [`Filter`] with per-method handlers.
//!
//! ## Overview
//!
//! A request path can satisfy several registrations at once. Instead of picking
//! one, the router enumerates every candidate route in registration order and the
//! dispatcher tries their filters in that order until one reports that it
//! finished the response (`over`). Nothing finishing falls back to a not-found
//! responder.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern compilation, the segment tree, and matching
//! - **[`filter`]** - per-method handler slots (`ANY` plus the nine HTTP methods)
//! - **[`dispatcher`]** - the ordered, short-circuiting filter loop
//! - **[`server`]** - request normalization, the response sink, and a `may_minihttp` adapter
//! - **[`route_table`]** - TOML route tables with static responses
//! - **[`runtime_config`]** / **[`logging`]** - environment-driven runtime and `tracing` setup
//! - **[`cli`]** - the `segroute` binary
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Dispatcher
//!     participant Router
//!     participant Filter
//!
//!     Client->>Server: GET /users/42?full=1
//!     Server->>Dispatcher: method, request target
//!     Dispatcher->>Dispatcher: normalize path, parse query
//!     Dispatcher->>Router: match_path(["users", "42"])
//!     Router-->>Dispatcher: candidate routes (captures + filters)
//!     loop each candidate, each filter
//!         Dispatcher->>Filter: handler(ctx, out)
//!         Filter-->>Dispatcher: over?
//!     end
//!     alt nothing returned over
//!         Dispatcher->>Router: not_found(out)
//!     end
//!     Server-->>Client: buffered status, headers, body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use segroute::dispatcher::Dispatcher;
//! use segroute::router::Router;
//! use segroute::server::BufferedResponse;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router
//!     .get("/users/:id(\\d+)/?:format", |ctx, out| {
//!         let id = ctx.field("id").unwrap_or_default();
//!         match ctx.field("format") {
//!             Some("json") => out.ok(format!("{{\"id\":{id}}}").as_bytes()),
//!             _ => out.ok(format!("user {id}").as_bytes()),
//!         }
//!         true
//!     })
//!     .any("/static/*", |ctx, out| {
//!         out.ok(ctx.path.join("/").as_bytes());
//!         true
//!     });
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//! let mut out = BufferedResponse::new();
//! dispatcher.dispatch(&Method::GET, "/users/7/json", &mut out);
//! assert_eq!(out.body_str(), "{\"id\":7}");
//! ```
//!
//! ## Serving
//!
//! The router is built once, then shared read-only. [`server::AppService`]
//! plugs a [`dispatcher::Dispatcher`] into `may_minihttp`, one coroutine per
//! connection:
//!
//! ```rust,no_run
//! use segroute::dispatcher::Dispatcher;
//! use segroute::router::Router;
//! use segroute::server::{start_server, AppService};
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.get("/hi", |_ctx, out| {
//!     out.ok(b"hello");
//!     true
//! });
//! let service = AppService::new(Dispatcher::new(Arc::new(router)));
//! let handle = start_server(service, "127.0.0.1:8080").unwrap();
//! handle.wait_ready().unwrap();
//! // ... serve until shutdown is requested
//! handle.stop();
//! ```

pub mod cli;
pub mod dispatcher;
pub mod filter;
pub mod logging;
pub mod route_table;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{DispatchOutcome, Dispatcher, RequestContext};
pub use filter::{Capability, Filter};
pub use router::{PatternError, Router};
pub use server::{BufferedResponse, ResponseSink};
