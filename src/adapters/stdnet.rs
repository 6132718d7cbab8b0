//! `std::net`-backed [`NetAdapter`] (spec §4.2 preamble, §9).
//!
//! No teacher analogue (`dav-server` has no network layer of its own — it
//! is handed already-parsed requests by an outer `hyper`/`warp`/`actix`
//! server). Built in the engine's own idiom directly on `TcpListener`/
//! `TcpStream`, set non-blocking so a caller-supplied `timeout_ms` (0 for a
//! true non-blocking probe, up to several seconds otherwise) can be honored
//! with a short poll loop rather than relying on OS socket timeouts, which
//! don't compose cleanly with the tick loop's own bookkeeping.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use crate::adapters::net::{Connection, Listener, NetAdapter};
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Binds to all interfaces; the embedding host is responsible for firewalling
/// the LAN-facing port (spec.md's non-goals exclude TLS/auth hardening).
pub struct StdNetAdapter {
    ipv4: [u8; 4],
}

impl StdNetAdapter {
    pub fn new(ipv4: [u8; 4]) -> Self {
        StdNetAdapter { ipv4 }
    }
}

impl Default for StdNetAdapter {
    fn default() -> Self {
        StdNetAdapter { ipv4: [0, 0, 0, 0] }
    }
}

impl NetAdapter for StdNetAdapter {
    fn bind(&mut self, port: u16) -> Result<Box<dyn Listener>> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(Error::Io)?;
        listener.set_nonblocking(true).map_err(Error::Io)?;
        Ok(Box::new(StdListener { listener, port }))
    }

    fn local_ipv4(&self) -> [u8; 4] {
        self.ipv4
    }
}

struct StdListener {
    listener: TcpListener,
    port: u16,
}

impl Listener for StdListener {
    fn accept(&mut self, timeout_ms: u64) -> Result<Box<dyn Connection>> {
        poll_until(timeout_ms, || match self.listener.accept() {
            Ok((stream, _addr)) => {
                stream.set_nonblocking(true).map_err(Error::Io)?;
                let _ = stream.set_nodelay(true);
                Ok(Some(Box::new(StdConn(stream)) as Box<dyn Connection>))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Io(e)),
        })
    }

    fn local_port(&self) -> u16 {
        self.port
    }
}

struct StdConn(TcpStream);

impl Connection for StdConn {
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u64) -> Result<usize> {
        poll_until(timeout_ms, || match self.0.read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => Ok(Some(0)),
            Err(e) => Err(Error::Io(e)),
        })
    }

    fn send(&mut self, buf: &[u8], timeout_ms: u64) -> Result<usize> {
        poll_until(timeout_ms, || match self.0.write(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Io(e)),
        })
    }

    fn close(&mut self) {
        let _ = self.0.shutdown(std::net::Shutdown::Both);
    }
}

/// Retry `attempt` until it yields `Some`, sleeping in short bursts, until
/// `timeout_ms` has elapsed. `timeout_ms == 0` runs `attempt` exactly once
/// (the "true non-blocking probe" spec §5 requires for `accept` and
/// opportunistic data-channel reads).
fn poll_until<T>(timeout_ms: u64, mut attempt: impl FnMut() -> Result<Option<T>>) -> Result<T> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if let Some(value) = attempt()? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(Error::WouldBlock);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
