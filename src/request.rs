//! Request-context capability consumed by [`Cookie::bake`](crate::Cookie::bake).
//!
//! The host server's request/response plumbing lives outside this crate; a
//! cookie only needs one narrow capability from it: appending a header to
//! the response of the request it belongs to. [`ResponseBuffer`] is a
//! reference implementation backed by [`http::HeaderMap`], useful for
//! embedders without a server of their own and for tests.

use std::sync::{Arc, RwLock};

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

/// One owning request, seen through the only capability a cookie needs.
///
/// Implementations are expected to manage their own internal
/// synchronization; the method takes `&self`.
pub trait RequestContext: Send + Sync {
    /// Appends `value` under `name` to the response headers of this
    /// request. Appending never replaces a previously appended header.
    fn append_response_header(&self, name: &str, value: &str);
}

/// A handle to a request context.
pub type RequestContextHandle = Arc<dyn RequestContext + Send + Sync>;

/// In-memory response-header collector.
///
/// Headers are kept in an [`http::HeaderMap`]; names and values that do
/// not parse as valid HTTP header input are logged and dropped, keeping
/// the capability's void signature.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    headers: RwLock<HeaderMap>,
}

impl ResponseBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns every value appended under `name`, in append order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .read()
            .unwrap()
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect()
    }

    /// True while nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.headers.read().unwrap().is_empty()
    }
}

impl RequestContext for ResponseBuffer {
    fn append_response_header(&self, name: &str, value: &str) {
        let header_name = match HeaderName::try_from(name) {
            Ok(header_name) => header_name,
            Err(_) => {
                log::warn!("dropping response header with invalid name {:?}", name);
                return;
            }
        };
        let header_value = match HeaderValue::try_from(value) {
            Ok(header_value) => header_value,
            Err(_) => {
                log::warn!("dropping response header '{}' with invalid value", header_name);
                return;
            }
        };
        self.headers.write().unwrap().append(header_name, header_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_and_reads_back_in_order() {
        let buffer = ResponseBuffer::new();
        buffer.append_response_header("set-cookie", "a=1");
        buffer.append_response_header("set-cookie", "b=2");

        assert_eq!(buffer.header_values("set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let buffer = ResponseBuffer::new();
        buffer.append_response_header("Set-Cookie", "a=1");

        assert_eq!(buffer.header_values("set-cookie"), vec!["a=1"]);
    }

    #[test]
    fn invalid_header_name_is_dropped() {
        let buffer = ResponseBuffer::new();
        buffer.append_response_header("bad name", "x");

        assert!(buffer.is_empty());
    }

    #[test]
    fn invalid_header_value_is_dropped() {
        let buffer = ResponseBuffer::new();
        buffer.append_response_header("x-test", "bad\nvalue");

        assert!(buffer.is_empty());
    }
}
