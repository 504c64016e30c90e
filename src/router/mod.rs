//! # Router Module
//!
//! The router compiles path patterns into typed segments, stores them in a
//! segment tree, and enumerates every registered route a request path
//! satisfies.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling patterns such as `/users/:id(\d+)/?:format` ([`segment`])
//! - Inserting filters into the tree in registration order ([`RoutingNode::insert`])
//! - Matching normalized request paths into ordered candidate routes ([`Router::match_path`])
//!
//! ## Pattern Syntax
//!
//! | Piece        | Meaning                                                     |
//! |--------------|-------------------------------------------------------------|
//! | `users`      | literal, case-insensitive                                   |
//! | `:id`        | named capture of one segment                                |
//! | `:id(\d+)`   | named capture that must satisfy the regex                   |
//! | `?:fmt`      | optional named capture (may be absent)                      |
//! | `(\d+)`      | unnamed capture that must satisfy the regex                 |
//! | `*`          | wildcard: as many segments as the rest of the pattern allows|
//!
//! ## Ambiguity
//!
//! A path may satisfy several registrations at once (`/u/me` against `/u/:id`
//! and `/u/me`). The matcher returns all of them, in registration order, and the
//! dispatcher tries them in that order.
//!
//! ## Example
//!
//! ```rust
//! use segroute::router::Router;
//!
//! let mut router = Router::new();
//! router.get("/a/?:fmt", |_ctx, out| {
//!     out.ok(b"a");
//!     true
//! });
//!
//! assert_eq!(router.match_path(&["a"]).len(), 1);
//! assert_eq!(router.match_path(&["a", "json"])[0].capture("fmt"), Some("json"));
//! ```

mod core;
pub mod segment;
mod tree;
#[cfg(test)]
mod tests;

pub use core::{Registration, Router};
pub use segment::{compile_pattern, compile_pattern_lenient, Constraint, PatternError, Segment};
pub use tree::{Captures, MatchedRoute, RoutingNode, MAX_INLINE_CAPTURES};
