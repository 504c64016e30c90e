#![allow(dead_code)]

use http::Method;
use segroute::dispatcher::{DispatchOutcome, Dispatcher};
use segroute::router::Router;
use segroute::server::BufferedResponse;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Dispatch one request against `router` into a fresh buffer.
pub fn dispatch(router: Router, method: Method, uri: &str) -> (BufferedResponse, DispatchOutcome) {
    let dispatcher = Dispatcher::new(Arc::new(router));
    let mut out = BufferedResponse::new();
    let outcome = dispatcher.dispatch(&method, uri, &mut out);
    (out, outcome)
}

/// Shared log of which filters ran, in order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Write a route table to a temporary file that lives as long as the handle.
pub fn write_table(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("segroute_table_")
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
