pub mod http_utils;

pub use http_utils::{build_http_client, http_client_builder, with_request_logging, RequestLogger};
