use super::request::{parse_request, ParsedRequest};
use super::response::{reason_phrase, BufferedResponse, HeaderLines, ResponseSink};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use http::StatusCode;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info};

/// `may_minihttp` service running every request through a [`Dispatcher`].
///
/// Each connection gets a clone; clones share the router and the header
/// line set.
#[derive(Debug, Clone)]
pub struct AppService {
    pub dispatcher: Dispatcher,
    pub header_lines: HeaderLines,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            header_lines: HeaderLines::new(),
        }
    }

    /// Dispatch into a fresh buffer. A panicking filter yields `500`.
    #[must_use]
    pub fn handle(&self, request: &ParsedRequest) -> (BufferedResponse, Option<DispatchOutcome>) {
        let mut buffer = BufferedResponse::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatcher.dispatch_parsed(request, &mut buffer)
        }));
        match result {
            Ok(outcome) => (buffer, Some(outcome)),
            Err(_) => {
                error!(method = %request.method, uri = %request.uri, "Filter panicked");
                let mut failed = BufferedResponse::new();
                failed.return_status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    reason_phrase(StatusCode::INTERNAL_SERVER_ERROR).as_bytes(),
                );
                (failed, None)
            }
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let started = Instant::now();
        let parsed = parse_request(&req);
        let (buffer, outcome) = self.handle(&parsed);
        info!(
            method = %parsed.method,
            uri = %parsed.uri,
            status = buffer.status().as_u16(),
            outcome = ?outcome,
            latency_us = started.elapsed().as_micros(),
            "Request complete"
        );
        buffer.write_to(res, &self.header_lines);
        Ok(())
    }
}
