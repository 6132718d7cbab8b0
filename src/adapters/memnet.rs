//! In-memory [`NetAdapter`] used by the engine's own test harness.
//!
//! No teacher analogue (`dav-server` has no network layer at all); built in
//! the engine's own idiom as a simple duplex byte-queue pair, so the FTP and
//! HTTP state machines can be driven tick-by-tick in unit/integration tests
//! without opening real sockets.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::adapters::net::{Connection, Listener, NetAdapter};
use crate::error::{Error, Result};

#[derive(Default)]
struct Pipe {
    data: VecDeque<u8>,
    closed: bool,
}

/// One end of an in-memory duplex connection. `MemConn::pair()` returns two
/// ends wired to each other: writes on one are reads on the other.
pub struct MemConn {
    inbox: Rc<RefCell<Pipe>>,
    outbox: Rc<RefCell<Pipe>>,
}

impl MemConn {
    pub fn pair() -> (MemConn, MemConn) {
        let a = Rc::new(RefCell::new(Pipe::default()));
        let b = Rc::new(RefCell::new(Pipe::default()));
        (
            MemConn {
                inbox: a.clone(),
                outbox: b.clone(),
            },
            MemConn {
                inbox: b,
                outbox: a,
            },
        )
    }
}

impl Connection for MemConn {
    fn recv(&mut self, buf: &mut [u8], _timeout_ms: u64) -> Result<usize> {
        let mut inbox = self.inbox.borrow_mut();
        if inbox.data.is_empty() {
            if inbox.closed {
                return Ok(0);
            }
            return Err(Error::WouldBlock);
        }
        let n = inbox.data.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inbox.data.pop_front().unwrap();
        }
        Ok(n)
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u64) -> Result<usize> {
        let mut outbox = self.outbox.borrow_mut();
        if outbox.closed {
            return Err(Error::Closed);
        }
        outbox.data.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn close(&mut self) {
        self.outbox.borrow_mut().closed = true;
    }
}

/// A listener fed by the test harness pushing pre-made [`MemConn`]s.
pub struct MemListener {
    port: u16,
    pending: Rc<RefCell<VecDeque<MemConn>>>,
}

impl MemListener {
    pub fn new(port: u16) -> (Self, MemListenerHandle) {
        let pending = Rc::new(RefCell::new(VecDeque::new()));
        (
            MemListener {
                port,
                pending: pending.clone(),
            },
            MemListenerHandle { pending },
        )
    }
}

/// Test-side handle used to push a connection at a listener.
#[derive(Clone)]
pub struct MemListenerHandle {
    pending: Rc<RefCell<VecDeque<MemConn>>>,
}

impl MemListenerHandle {
    pub fn push(&self, conn: MemConn) {
        self.pending.borrow_mut().push_back(conn);
    }
}

impl Listener for MemListener {
    fn accept(&mut self, _timeout_ms: u64) -> Result<Box<dyn Connection>> {
        match self.pending.borrow_mut().pop_front() {
            Some(c) => Ok(Box::new(c)),
            None => Err(Error::WouldBlock),
        }
    }

    fn local_port(&self) -> u16 {
        self.port
    }
}

/// A `NetAdapter` that hands out [`MemListener`]s. Every bound port's push
/// handle is retained in `handles` so a test driving a server purely
/// through the `NetAdapter`/`Tickable` interface (as `tick()` does) can
/// still reach in and push a connection with [`MemNet::handle_for`].
pub struct MemNet {
    pub ipv4: [u8; 4],
    handles: Rc<RefCell<std::collections::BTreeMap<u16, MemListenerHandle>>>,
}

impl Default for MemNet {
    fn default() -> Self {
        MemNet {
            ipv4: [127, 0, 0, 1],
            handles: Rc::new(RefCell::new(std::collections::BTreeMap::new())),
        }
    }
}

impl NetAdapter for MemNet {
    fn bind(&mut self, port: u16) -> Result<Box<dyn Listener>> {
        let (listener, handle) = MemListener::new(port);
        self.handles.borrow_mut().insert(port, handle);
        Ok(Box::new(listener))
    }

    fn local_ipv4(&self) -> [u8; 4] {
        self.ipv4
    }
}

impl MemNet {
    /// Bind and return both the `Listener` and the handle used to push
    /// incoming connections — the shape a test that owns the listener
    /// directly (rather than through a `&mut dyn NetAdapter`) wants.
    pub fn bind_with_handle(&self, port: u16) -> (MemListener, MemListenerHandle) {
        MemListener::new(port)
    }

    /// Retrieve the push handle for a port this adapter has already bound
    /// (e.g. via `FtpServer::start`/`HttpServer::start`), so a test can feed
    /// in a connection without holding the `Listener` itself.
    pub fn handle_for(&self, port: u16) -> Option<MemListenerHandle> {
        self.handles.borrow().get(&port).cloned()
    }

    /// Clone out the shared handle registry before handing `&mut self` to a
    /// server's `start()`: the registry is independent `Rc` storage, so a
    /// test can keep querying `handle_for`-style lookups through it even
    /// while the adapter itself sits behind the server's exclusive borrow.
    pub fn registry(&self) -> MemNetRegistry {
        MemNetRegistry {
            handles: self.handles.clone(),
        }
    }
}

/// A detached handle onto [`MemNet`]'s bound-listener registry (see
/// [`MemNet::registry`]).
#[derive(Clone)]
pub struct MemNetRegistry {
    handles: Rc<RefCell<std::collections::BTreeMap<u16, MemListenerHandle>>>,
}

impl MemNetRegistry {
    pub fn handle_for(&self, port: u16) -> Option<MemListenerHandle> {
        self.handles.borrow().get(&port).cloned()
    }
}
