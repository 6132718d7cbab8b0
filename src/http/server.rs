//! HTTP server loop (spec §4.5).
//!
//! Owns the control listener and at most one connection, matching the
//! teacher's single-`DavHandler`-instance-per-request model but with the
//! socket lifecycle pulled in-crate instead of delegated to `hyper`/`warp`.
//! Per spec §5: `accept` uses a 0 (non-blocking) timeout every tick;
//! header/body reads and response writes use the longer 5-10 s timeout the
//! spec calls out, since once a client has started talking the rest of the
//! frame is expected promptly.

use log::{debug, warn};

use crate::adapters::clock::ClockAdapter;
use crate::adapters::fs::FsAdapter;
use crate::adapters::net::{Connection, Listener, NetAdapter};
use crate::config::HttpConfig;
use crate::dav::DavMethodHandler;
use crate::error::{Error, Result};
use crate::http::dispatch::{self, DispatchOutcome};
use crate::http::framing::ByteSource;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::transfer::{self, GetTransfer, TransferStep};
use crate::server::Tickable;

const HEADER_TIMEOUT_MS: u64 = 8_000;
const BODY_TIMEOUT_MS: u64 = 8_000;
const WRITE_TIMEOUT_MS: u64 = 8_000;
/// Generous but bounded request-body cap; nothing in spec.md pins an exact
/// number, so this follows the order of magnitude of the transfer buffer
/// scaled up for a single in-memory body rather than an unbounded one.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub struct HttpServer<'a> {
    config: HttpConfig,
    fs: &'a dyn FsAdapter,
    dav: &'a dyn DavMethodHandler,
    clock: &'a dyn ClockAdapter,
    listener: Option<Box<dyn Listener>>,
    connection: Option<Box<dyn Connection>>,
    pending_stream: Option<(Response, GetTransfer<'a>)>,
    running: bool,
}

impl<'a> HttpServer<'a> {
    pub fn new(
        config: HttpConfig,
        fs: &'a dyn FsAdapter,
        dav: &'a dyn DavMethodHandler,
        clock: &'a dyn ClockAdapter,
    ) -> Self {
        HttpServer {
            config,
            fs,
            dav,
            clock,
            listener: None,
            connection: None,
            pending_stream: None,
            running: false,
        }
    }

    /// Bind the control listener and mark the server running (spec §4.5).
    pub fn start(&mut self, net: &mut dyn NetAdapter) -> Result<()> {
        let listener = net.bind(self.config.listen_port)?;
        debug!("HTTP: listening on :{}", self.config.listen_port);
        self.listener = Some(listener);
        self.running = true;
        Ok(())
    }

    /// Close, in order: transfer, connection, listener (spec §4.5).
    pub fn stop(&mut self) {
        self.pending_stream = None;
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
        self.listener = None;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn close_connection(&mut self) {
        self.pending_stream = None;
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
    }

    fn flush_and_maybe_close(&mut self, mut res: Response) {
        let wire = res.take_wire();
        let close = res.close_after_response();
        if let Some(conn) = self.connection.as_mut() {
            if transfer::write_all(conn.as_mut(), &wire, WRITE_TIMEOUT_MS).is_err() {
                self.close_connection();
                return;
            }
        }
        if close {
            self.close_connection();
        }
    }

    fn handle_request(&mut self, req: Request) {
        debug!("HTTP: {:?} {}", req.method, req.path);
        match dispatch::dispatch(&req, self.fs, self.dav, &self.config.server_header, self.clock) {
            DispatchOutcome::Complete(res) => self.flush_and_maybe_close(res),
            DispatchOutcome::StreamGet(mut res, transfer) => {
                let wire = res.take_wire();
                if let Some(conn) = self.connection.as_mut() {
                    if transfer::write_all(conn.as_mut(), &wire, WRITE_TIMEOUT_MS).is_err() {
                        self.close_connection();
                        return;
                    }
                }
                self.pending_stream = Some((res, transfer));
            }
        }
    }

    fn reply_framing_error(&mut self, err: Error) {
        warn!("HTTP: framing error: {err}");
        let date = crate::adapters::clock::http_date(self.clock.now_unix());
        let res = Response::from_error(&err, true, self.config.server_header.clone(), date);
        self.flush_and_maybe_close(res);
        self.close_connection();
    }

    fn step_stream(&mut self) {
        let Some((mut res, mut transfer)) = self.pending_stream.take() else {
            return;
        };
        let mut buf = vec![0u8; self.config.transfer_buf];
        let Some(conn) = self.connection.as_mut() else {
            return;
        };
        match transfer.step(&mut buf, &mut res, conn.as_mut(), WRITE_TIMEOUT_MS) {
            Ok(TransferStep::Progress) => self.pending_stream = Some((res, transfer)),
            Ok(TransferStep::Done) => {
                if res.close_after_response() {
                    self.close_connection();
                }
            }
            Err(_) => self.close_connection(),
        }
    }

    fn service_connection(&mut self) {
        if self.pending_stream.is_some() {
            self.step_stream();
            return;
        }

        let cap = self.config.transfer_buf.max(16 * 1024);
        let Some(conn) = self.connection.as_mut() else {
            return;
        };
        let mut src = ByteSource::new(conn.as_mut(), cap);

        match Request::parse(&mut src, HEADER_TIMEOUT_MS) {
            Ok(mut req) => match crate::http::body::read_body(&mut src, req.body_mode, MAX_BODY_BYTES, BODY_TIMEOUT_MS)
            {
                Ok(body) => {
                    req.set_body(body);
                    self.handle_request(req);
                }
                Err(err) => self.reply_framing_error(err),
            },
            Err(Error::WouldBlock) => {}
            Err(err) => self.reply_framing_error(err),
        }
    }
}

impl<'a> Tickable for HttpServer<'a> {
    fn tick(&mut self, _now_ms: u64) {
        if !self.running {
            return;
        }
        if self.connection.is_none() {
            let Some(listener) = self.listener.as_mut() else {
                return;
            };
            match listener.accept(0) {
                Ok(conn) => {
                    debug!("HTTP: accepted connection");
                    self.connection = Some(conn);
                }
                Err(Error::WouldBlock) => {}
                Err(err) => warn!("HTTP: accept error: {err}"),
            }
            return;
        }
        self.service_connection();
    }
}
