//! HTTP/1.1 response writer (spec §4.4).
//!
//! Grounded on the teacher's response-building style in
//! `davhandler/handle_mkcol.rs`/`handle_options.rs` (status code + headers
//! + typed body), reimplemented as a raw byte writer with the monotonic
//! `init -> head-written -> (body-written)* -> finished` state machine spec
//! §3 "Response (HTTP)" specifies, since there is no underlying `http`-crate
//! `Response<Body>` to build here.

use crate::error::Error;

/// Reason phrases spec §4.4 enumerates; anything else defaults to "OK".
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        207 => "Multi-Status",
        301 => "Moved Permanently",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "OK",
    }
}

/// Violating the monotonic state machine (writing a body before the head,
/// or writing after finish) is a programmer error, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingViolation {
    BodyBeforeHead,
    WriteAfterFinished,
}

pub struct Response {
    status: (u16, &'static str),
    headers: Vec<(String, String)>,
    wrote_head: bool,
    chunked: bool,
    finished: bool,
    close_after_response: bool,
    server_header: String,
    wire: Vec<u8>,
}

impl Response {
    /// `date` is the already-formatted `Date` header value (spec.md's clock
    /// adapter supplies UTC seconds; formatting it is the caller's job via
    /// [`crate::adapters::clock::http_date`]), added up front since headers
    /// must be queued before any `write_*`/`finish*` call serializes them.
    pub fn new(close_requested: bool, server_header: impl Into<String>, date: impl Into<String>) -> Self {
        let mut res = Response {
            status: (200, "OK"),
            headers: Vec::new(),
            wrote_head: false,
            chunked: false,
            finished: false,
            close_after_response: close_requested,
            server_header: server_header.into(),
            wire: Vec::new(),
        };
        res.add_header("Date", date.into());
        res
    }

    pub fn set_status(&mut self, code: u16, reason: &'static str) {
        self.status = (code, reason);
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn request_close(&mut self) {
        self.close_after_response = true;
    }

    pub fn close_after_response(&self) -> bool {
        self.close_after_response
    }

    fn write_preamble(&mut self, framing: &str) {
        self.wire
            .extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.status.0, self.status.1).as_bytes());
        self.wire
            .extend_from_slice(format!("Server: {}\r\n", self.server_header).as_bytes());
        let conn = if self.close_after_response {
            "close"
        } else {
            "keep-alive"
        };
        self.wire
            .extend_from_slice(format!("Connection: {conn}\r\n").as_bytes());
        for (name, value) in &self.headers {
            self.wire
                .extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        self.wire.extend_from_slice(framing.as_bytes());
        self.wire.extend_from_slice(b"\r\n");
        self.wrote_head = true;
    }

    /// Write the head with a fixed `Content-Length` framing, with no body.
    pub fn finish_empty(&mut self) {
        self.write_preamble("Content-Length: 0\r\n");
        self.finished = true;
    }

    /// Write the head plus a full fixed-length body in one shot.
    pub fn write_body_fixed(&mut self, body: &[u8]) -> Result<(), FramingViolation> {
        if self.wrote_head {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.write_preamble(&format!("Content-Length: {}\r\n", body.len()));
        self.wire.extend_from_slice(body);
        self.finished = true;
        Ok(())
    }

    /// Write the head for a fixed-length body whose bytes will follow over
    /// one or more [`write_raw_body`] calls — the streaming counterpart of
    /// [`write_body_fixed`], used by GET so a large file is moved through
    /// the transfer buffer one chunk per tick rather than read into memory
    /// all at once.
    pub fn write_head_fixed(&mut self, content_length: usize) -> Result<(), FramingViolation> {
        if self.wrote_head {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.write_preamble(&format!("Content-Length: {content_length}\r\n"));
        Ok(())
    }

    /// Append one already-framed chunk of a fixed-length body.
    pub fn write_raw_body(&mut self, data: &[u8]) -> Result<(), FramingViolation> {
        if !self.wrote_head || self.chunked {
            return Err(FramingViolation::BodyBeforeHead);
        }
        if self.finished {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.wire.extend_from_slice(data);
        Ok(())
    }

    /// Mark a fixed-length streamed body as complete.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Start a chunked response. Follow with [`write_chunk`] calls and a
    /// final [`finish_chunked`].
    pub fn start_chunked(&mut self) -> Result<(), FramingViolation> {
        if self.wrote_head {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.chunked = true;
        self.write_preamble("Transfer-Encoding: chunked\r\n");
        Ok(())
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), FramingViolation> {
        if !self.wrote_head || !self.chunked {
            return Err(FramingViolation::BodyBeforeHead);
        }
        if self.finished {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.wire.extend_from_slice(&crate::http::body::encode_chunk(data));
        Ok(())
    }

    pub fn finish_chunked(&mut self) -> Result<(), FramingViolation> {
        if !self.chunked || self.finished {
            return Err(FramingViolation::WriteAfterFinished);
        }
        self.wire.extend_from_slice(crate::http::body::final_chunk());
        self.finished = true;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the bytes accumulated so far, for the caller to hand to the
    /// connection adapter in transfer-buffer-sized writes.
    pub fn take_wire(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.wire)
    }

    /// Build an error response per spec §7's propagation policy.
    pub fn from_error(err: &Error, close_requested: bool, server_header: impl Into<String>, date: impl Into<String>) -> Response {
        let mut res = Response::new(close_requested || err.must_close(), server_header, date);
        let status = err.to_http_status();
        res.set_status(status.0, status.1);
        res.finish_empty();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_body_includes_content_length() {
        let mut res = Response::new(false, "Paper Portal", "Thu, 01 Jan 1970 00:00:00 GMT");
        res.write_body_fixed(b"hello").unwrap();
        let wire = String::from_utf8(res.take_wire()).unwrap();
        assert!(wire.contains("Content-Length: 5"));
        assert!(wire.contains("Date: Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(wire.ends_with("hello"));
    }

    #[test]
    fn chunked_response_terminates_with_zero_chunk() {
        let mut res = Response::new(false, "Paper Portal", "Thu, 01 Jan 1970 00:00:00 GMT");
        res.start_chunked().unwrap();
        res.write_chunk(b"hi").unwrap();
        res.finish_chunked().unwrap();
        let wire = res.take_wire();
        assert!(wire.ends_with(b"0\r\n\r\n"));
    }

    #[test]
    fn double_head_write_is_a_framing_violation() {
        let mut res = Response::new(false, "Paper Portal", "Thu, 01 Jan 1970 00:00:00 GMT");
        res.write_body_fixed(b"a").unwrap();
        assert_eq!(
            res.write_body_fixed(b"b").unwrap_err(),
            FramingViolation::WriteAfterFinished
        );
    }
}
