//! Minimal HTTP/1.1 response serialization.
//!
//! Just enough framing to look plausible to a naive client: a status line, a
//! content-type header, a blank line, and the body. No content-length; the
//! connection close delimits the body.

use bytes::BytesMut;

/// A synthetic HTTP response.
#[derive(Debug, Clone)]
pub struct NaiveHttpResponse {
    code: u16,
    reason: String,
    content_type: String,
    body: String,
}

impl NaiveHttpResponse {
    pub fn new(code: u16, reason: &str, content_type: &str, body: &str) -> Self {
        NaiveHttpResponse {
            code,
            reason: reason.to_string(),
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(64 + self.body.len());
        out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.code, self.reason).as_bytes());
        out.extend_from_slice(format!("Content-Type: {}\r\n", self.content_type).as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(self.body.as_bytes());
        out
    }
}
