//! # CLI Module
//!
//! Command-line front end for route tables (see [`crate::route_table`]).
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve a route table over HTTP until SIGINT or SIGTERM:
//!
//! ```bash
//! segroute serve --routes routes.toml --addr 127.0.0.1:8080
//! ```
//!
//! Options:
//! - `--routes <FILE>` - Route table (required)
//! - `--addr <ADDR>` - Listen address (default: `0.0.0.0:8080`)
//! - `--strict` - Fail on malformed regex constraints
//!
//! ### `match`
//!
//! Show the candidate routes for a request and the response dispatch would
//! produce, without opening a socket:
//!
//! ```bash
//! segroute match --routes routes.toml GET /users/42
//! ```
//!
//! ### `routes`
//!
//! Print the registrations and the routing tree:
//!
//! ```bash
//! segroute routes --routes routes.toml
//! ```

mod commands;


pub use commands::{describe_match, load_router, run_cli, Cli, Commands};
