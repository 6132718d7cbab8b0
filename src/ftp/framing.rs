//! FTP control-connection line framing (spec §4.3 "Tick discipline").
//!
//! Unlike HTTP's request-head read (which the tick loop is allowed to block
//! on for a few seconds per spec §5), the FTP tick discipline requires a
//! true non-blocking probe every tick ("if a control connection exists and
//! has a parse-ready line, dispatch one command"). `CommandReader` persists
//! its buffer across ticks so a command line arriving split across several
//! `recv` calls is never dropped.

use crate::adapters::net::Connection;
use crate::error::{Error, Result};

pub struct CommandReader {
    pending: Vec<u8>,
    cap: usize,
}

impl CommandReader {
    pub fn new(cap: usize) -> Self {
        CommandReader { pending: Vec::new(), cap }
    }

    /// Pull whatever bytes are immediately available (timeout 0) and, if a
    /// full CRLF-terminated line is now buffered, return it (without the
    /// terminator). Returns `Ok(None)` when no full line is ready yet.
    pub fn poll_line(&mut self, conn: &mut dyn Connection) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; 512];
        loop {
            match conn.recv(&mut buf, 0) {
                Ok(0) => return Err(Error::Closed),
                Ok(n) => {
                    if self.pending.len() + n > self.cap {
                        return Err(Error::LineTooLong);
                    }
                    self.pending.extend_from_slice(&buf[..n]);
                }
                Err(Error::WouldBlock) => break,
                Err(err) => return Err(err),
            }
        }
        if let Some(pos) = find_crlf(&self.pending) {
            let line = self.pending[..pos].to_vec();
            self.pending.drain(..pos + 2);
            return Ok(Some(line));
        }
        if self.pending.len() > self.cap {
            return Err(Error::LineTooLong);
        }
        Ok(None)
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
    fn reads_line_split_across_polls() {
        let (mut a, mut b) = MemConn::pair();
        let mut reader = CommandReader::new(1024);
        assert_eq!(reader.poll_line(&mut a).unwrap(), None);
        b.send(b"USER pap", 0).unwrap();
        assert_eq!(reader.poll_line(&mut a).unwrap(), None);
        b.send(b"er\r\n", 0).unwrap();
        assert_eq!(reader.poll_line(&mut a).unwrap(), Some(b"USER paper".to_vec()));
    }

    #[test]
    fn leftover_bytes_after_line_are_kept_for_next_poll() {
        let (mut a, mut b) = MemConn::pair();
        let mut reader = CommandReader::new(1024);
        b.send(b"PWD\r\nQUIT\r\n", 0).unwrap();
        assert_eq!(reader.poll_line(&mut a).unwrap(), Some(b"PWD".to_vec()));
        assert_eq!(reader.poll_line(&mut a).unwrap(), Some(b"QUIT".to_vec()));
    }
}
