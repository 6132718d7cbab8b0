//! Per-tick streaming step for GET responses (spec §9 "Reply/response
//! writers as generators").
//!
//! A file body is not buffered whole into the response; each [`GetTransfer::step`]
//! moves exactly one transfer-buffer-sized chunk from the `FsAdapter` reader
//! to the connection, mirroring the same generator shape the FTP transfer
//! loop uses for RETR.

use crate::adapters::fs::Reader;
use crate::adapters::net::Connection;
use crate::error::{Error, Result};
use crate::http::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    Progress,
    Done,
}

pub struct GetTransfer<'a> {
    reader: Box<dyn Reader + 'a>,
    done: bool,
}

impl<'a> GetTransfer<'a> {
    pub fn new(reader: Box<dyn Reader + 'a>) -> Self {
        GetTransfer { reader, done: false }
    }

    /// Read one chunk into `buf`, frame it into `res`, and flush it to
    /// `conn`. Returns `Done` once EOF is reached and the flushed wire is
    /// empty (the response is fully sent).
    pub fn step(
        &mut self,
        buf: &mut [u8],
        res: &mut Response,
        conn: &mut dyn Connection,
        timeout_ms: u64,
    ) -> Result<TransferStep> {
        if self.done {
            return Ok(TransferStep::Done);
        }
        let n = self.reader.read(buf)?;
        if n == 0 {
            res.finish();
            self.done = true;
            return Ok(TransferStep::Done);
        }
        res.write_raw_body(&buf[..n]).map_err(|_| Error::Closed)?;
        let wire = res.take_wire();
        write_all(conn, &wire, timeout_ms)?;
        Ok(TransferStep::Progress)
    }
}

/// Write `data` to `conn` in full, looping over partial `send`s.
pub fn write_all(conn: &mut dyn Connection, mut data: &[u8], timeout_ms: u64) -> Result<()> {
    while !data.is_empty() {
        let n = conn.send(data, timeout_ms)?;
        if n == 0 {
            return Err(Error::Closed);
        }
        data = &data[n..];
    }
    Ok(())
}
