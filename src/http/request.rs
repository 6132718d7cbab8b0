//! HTTP/1.1 request-line and header parsing (spec §4.4, §3).
//!
//! Grounded on the teacher's method-to-`DavMethod` translation
//! (`util::dav_method`) and its request path extraction
//! (`davhandler::path`/`DavPath::from_uri_and_prefix`), reimplemented here
//! over raw bytes off the wire instead of an already-parsed `http::Request`.

use crate::config::HTTP_MAX_HEADERS;
use crate::error::{Error, Result};
use crate::http::framing::ByteSource;

/// The method token, translated into the engine's own enum (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Get,
    Head,
    Put,
    Delete,
    Mkcol,
    Copy,
    Move,
    PropFind,
    PropPatch,
    Other,
}

impl Method {
    pub fn parse(token: &str) -> Method {
        match token {
            "OPTIONS" => Method::Options,
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "MKCOL" => Method::Mkcol,
            "COPY" => Method::Copy,
            "MOVE" => Method::Move,
            "PROPFIND" => Method::PropFind,
            "PROPPATCH" => Method::PropPatch,
            _ => Method::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Request body framing mode, derived from `Transfer-Encoding`/
/// `Content-Length` (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    None,
    Fixed(usize),
    Chunked,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub raw_target: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<Header>,
    pub body_mode: BodyMode,
    pub close_requested: bool,
    body: Vec<u8>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Parse the request-line and header block off `src`, capped at
    /// `src`'s configured capacity (the 16 KiB scratch of spec §4.4).
    pub fn parse(src: &mut ByteSource, timeout_ms: u64) -> Result<Request> {
        let line = src.read_line(timeout_ms)?;
        let line = std::str::from_utf8(&line).map_err(|_| Error::BadRequest)?;
        let mut parts = line.splitn(3, ' ');
        let method_tok = parts.next().ok_or(Error::BadRequest)?;
        let target = parts.next().ok_or(Error::BadRequest)?;
        let _version = parts.next().ok_or(Error::BadRequest)?;

        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (target.to_string(), None),
        };

        let mut headers = Vec::new();
        loop {
            let line = src.read_line(timeout_ms)?;
            if line.is_empty() {
                break;
            }
            if headers.len() >= HTTP_MAX_HEADERS {
                return Err(Error::BadRequest);
            }
            let line = std::str::from_utf8(&line).map_err(|_| Error::BadRequest)?;
            // Continuation lines (leading whitespace) are not supported (spec §4.4).
            if line.starts_with(' ') || line.starts_with('\t') {
                return Err(Error::BadRequest);
            }
            let (name, value) = line.split_once(':').ok_or(Error::BadRequest)?;
            headers.push(Header {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            });
        }

        let body_mode = body_mode_from_headers(&headers);
        let close_requested = headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case("connection"))
            .map(|h| h.value.eq_ignore_ascii_case("close"))
            .unwrap_or(false);

        Ok(Request {
            method: Method::parse(method_tok),
            raw_target: target.to_string(),
            path,
            query,
            headers,
            body_mode,
            close_requested,
            body: Vec::new(),
        })
    }
}

/// Tokenize `Transfer-Encoding` on `,` and compare the *last* coding against
/// `chunked`, rather than the original's questionable substring match (spec
/// §9 open question; DESIGN.md decision 1).
fn body_mode_from_headers(headers: &[Header]) -> BodyMode {
    if let Some(te) = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("transfer-encoding"))
    {
        if let Some(last) = te.value.split(',').next_back() {
            if last.trim().eq_ignore_ascii_case("chunked") {
                return BodyMode::Chunked;
            }
        }
    }
    if let Some(cl) = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
    {
        if let Ok(n) = cl.value.trim().parse::<usize>() {
            return BodyMode::Fixed(n);
        }
    }
    BodyMode::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memnet::MemConn;

    fn parse(raw: &[u8]) -> Request {
        let (mut a, mut b) = MemConn::pair();
        b.send(raw, 0).unwrap();
        let mut src = ByteSource::new(&mut a, 16 * 1024);
        Request::parse(&mut src, 0).unwrap()
    }

    #[test]
    fn parses_method_and_path() {
        let req = parse(b"GET /a/b.txt HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/a/b.txt");
    }

    #[test]
    fn splits_query_from_path() {
        let req = parse(b"GET /a?x=1 HTTP/1.1\r\n\r\n");
        assert_eq!(req.path, "/a");
        assert_eq!(req.query.as_deref(), Some("x=1"));
    }

    #[test]
    fn content_length_sets_fixed_mode() {
        let req = parse(b"PUT /f HTTP/1.1\r\nContent-Length: 5\r\n\r\n");
        assert_eq!(req.body_mode, BodyMode::Fixed(5));
    }

    #[test]
    fn chunked_transfer_encoding_wins_over_unrelated_substring() {
        let req = parse(b"PUT /f HTTP/1.1\r\nTransfer-Encoding: unchunked-like, chunked\r\n\r\n");
        assert_eq!(req.body_mode, BodyMode::Chunked);
    }

    #[test]
    fn continuation_lines_are_rejected() {
        let (mut a, mut b) = MemConn::pair();
        b.send(b"GET / HTTP/1.1\r\nX-A: 1\r\n continuation\r\n\r\n", 0)
            .unwrap();
        let mut src = ByteSource::new(&mut a, 16 * 1024);
        assert!(Request::parse(&mut src, 0).is_err());
    }
}
