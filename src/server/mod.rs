pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{start_server, ServerHandle};
pub use request::{normalize_path, parse_query, parse_request, ParsedRequest, QueryParams};
pub use response::{
    reason_phrase, write_method_not_allowed, write_not_found, BufferedResponse, HeaderLines,
    HeaderVec, ResponseSink, MAX_INLINE_HEADERS, MAX_INTERNED_HEADER_LINES,
};
pub use service::AppService;
