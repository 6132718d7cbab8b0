//! Shared byte-source plumbing for HTTP/1.1 framing (spec §4.4).
//!
//! The request-line/header parser, the request-body reader, and keep-alive
//! body draining all need the same thing: pull bytes off the connection
//! with a timeout, buffer anything read past the boundary they were looking
//! for, and hand the rest to the next reader. `ByteSource` is that shared
//! buffer, grounded in spirit on the teacher's `read_request` helper
//! (`davhandler/mod.rs`) which drains a body into a `Vec<u8>` up to a max
//! size — generalized here to also serve line-oriented reads.

use crate::adapters::Connection;
use crate::error::{Error, Result};

pub struct ByteSource<'a> {
    conn: &'a mut dyn Connection,
    pending: Vec<u8>,
    cursor: usize,
    cap: usize,
}

impl<'a> ByteSource<'a> {
    pub fn new(conn: &'a mut dyn Connection, cap: usize) -> Self {
        ByteSource {
            conn,
            pending: Vec::new(),
            cursor: 0,
            cap,
        }
    }

    /// Seed already-read bytes (e.g. overread past the header block).
    pub fn seed(&mut self, bytes: Vec<u8>) {
        self.pending = bytes;
        self.cursor = 0;
    }

    /// Bytes still buffered but not yet consumed — handed back to whoever
    /// reads the next frame (e.g. the request body reader after headers).
    pub fn take_remainder(self) -> Vec<u8> {
        self.pending[self.cursor..].to_vec()
    }

    fn available(&self) -> usize {
        self.pending.len() - self.cursor
    }

    fn fill_more(&mut self, timeout_ms: u64) -> Result<usize> {
        if self.pending.len() >= self.cap {
            return Err(Error::LineTooLong);
        }
        let mut buf = [0u8; 4096];
        let want = buf.len().min(self.cap - self.pending.len());
        let n = self.conn.recv(&mut buf[..want], timeout_ms)?;
        if n == 0 {
            return Err(Error::UnexpectedEndOfStream);
        }
        self.pending.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    /// Read a single CRLF-terminated line, without the terminator, waiting
    /// up to `timeout_ms` for each underlying recv.
    pub fn read_line(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        loop {
            if let Some(rel) = find_crlf(&self.pending[self.cursor..]) {
                let line = self.pending[self.cursor..self.cursor + rel].to_vec();
                self.cursor += rel + 2;
                return Ok(line);
            }
            if self.available() >= self.cap {
                return Err(Error::LineTooLong);
            }
            self.fill_more(timeout_ms)?;
        }
    }

    /// Read exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        while self.available() < n {
            self.fill_more(timeout_ms)?;
        }
        let out = self.pending[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(out)
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memnet::MemConn;

    #[test]
    fn read_line_splits_on_crlf() {
        let (mut a, mut b) = MemConn::pair();
        b.send(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", 0).unwrap();
        let mut src = ByteSource::new(&mut a, 4096);
        assert_eq!(src.read_line(0).unwrap(), b"GET / HTTP/1.1");
        assert_eq!(src.read_line(0).unwrap(), b"Host: x");
        assert_eq!(src.read_line(0).unwrap(), b"");
    }

    #[test]
    fn read_exact_pulls_across_recv_calls() {
        let (mut a, mut b) = MemConn::pair();
        b.send(b"hello", 0).unwrap();
        let mut src = ByteSource::new(&mut a, 4096);
        assert_eq!(src.read_exact(5, 0).unwrap(), b"hello");
    }
}
