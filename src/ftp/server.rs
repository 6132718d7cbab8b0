//! FTP server loop (spec §4.3 "Tick discipline", §4.5 "Server loop").
//!
//! No teacher analogue; the single-session accept/dispatch/transfer-step
//! loop spec §4.3 describes, built in the teacher's density of `debug!`
//! logging but with the socket and session lifecycle entirely in-crate.

use log::{debug, warn};

use crate::adapters::clock::ClockAdapter;
use crate::adapters::fs::FsAdapter;
use crate::adapters::net::{Connection, Listener, NetAdapter};
use crate::config::FtpConfig;
use crate::error::Error;
use crate::ftp::ascii::{LineEndingDecoder, LineEndingEncoder};
use crate::ftp::commands;
use crate::ftp::dirlist::{format_list_entry, format_nlst_entry};
use crate::ftp::framing::CommandReader;
use crate::ftp::passive::PassivePool;
use crate::ftp::session::{PendingOp, Session, Transfer, TransferType};
use crate::server::Tickable;

const LINE_TIMEOUT_MS: u64 = 0;
const DATA_TIMEOUT_MS: u64 = 0;

pub struct FtpServer<'a> {
    config: FtpConfig,
    fs: &'a dyn FsAdapter,
    clock: &'a dyn ClockAdapter,
    net: Option<&'a mut dyn NetAdapter>,
    passive_pool: PassivePool,
    control_listener: Option<Box<dyn Listener>>,
    control_conn: Option<Box<dyn Connection>>,
    command_reader: CommandReader,
    session: Option<Session<'a>>,
    running: bool,
    /// Reply bytes not yet flushed to `control_conn`, left over from a
    /// `WouldBlock` on a previous tick (spec §7: `WouldBlock` is always
    /// recovered locally, never surfaced as a fatal error).
    pending_reply: Vec<u8>,
}

impl<'a> FtpServer<'a> {
    pub fn new(config: FtpConfig, fs: &'a dyn FsAdapter, clock: &'a dyn ClockAdapter) -> Self {
        let pool = PassivePool::new(config.pasv_port_range);
        let reader_cap = config.command_buf;
        FtpServer {
            config,
            fs,
            clock,
            net: None,
            passive_pool: pool,
            control_listener: None,
            control_conn: None,
            command_reader: CommandReader::new(reader_cap),
            session: None,
            running: false,
            pending_reply: Vec::new(),
        }
    }

    /// Bind the control listener and retain the adapter for later `PASV`
    /// rebinds (spec §4.5): unlike the HTTP listener, the engine must bind a
    /// fresh passive-mode listener on demand, long after `start` returns.
    pub fn start(&mut self, net: &'a mut dyn NetAdapter) -> crate::error::Result<()> {
        let listener = net.bind(self.config.control_port)?;
        debug!("FTP: listening on :{}", self.config.control_port);
        self.control_listener = Some(listener);
        self.net = Some(net);
        self.running = true;
        Ok(())
    }

    /// Close, in order: transfer handle, data connection, passive listener,
    /// control connection, control listener (spec §4.5).
    pub fn stop(&mut self) {
        self.session = None; // drops any transfer, its data connection, or an armed passive listener
        if let Some(mut conn) = self.control_conn.take() {
            conn.close();
        }
        self.control_listener = None;
        self.net = None;
        self.running = false;
        self.pending_reply.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn close_control(&mut self) {
        self.session = None;
        self.command_reader = CommandReader::new(self.config.command_buf);
        self.pending_reply.clear();
        if let Some(mut conn) = self.control_conn.take() {
            conn.close();
        }
    }

    /// Queue a reply line, then try to flush it immediately. A `WouldBlock`
    /// leaves the unsent remainder in `pending_reply` for `flush_pending_reply`
    /// to retry on a later tick, rather than tearing down the connection.
    fn write_reply(&mut self, code: u16, text: &str) {
        let line = commands::render_reply(code, text);
        self.pending_reply.extend_from_slice(line.as_bytes());
        self.flush_pending_reply();
    }

    /// Try to drain `pending_reply` into `control_conn`. Returns `true` once
    /// fully flushed (including when there was nothing to flush).
    fn flush_pending_reply(&mut self) -> bool {
        if self.pending_reply.is_empty() {
            return true;
        }
        let Some(conn) = self.control_conn.as_mut() else {
            self.pending_reply.clear();
            return true;
        };
        match write_some(conn.as_mut(), &self.pending_reply, LINE_TIMEOUT_MS) {
            Ok(WriteOutcome::Done) => {
                self.pending_reply.clear();
                true
            }
            Ok(WriteOutcome::Pending(rest)) => {
                self.pending_reply = rest;
                false
            }
            Err(_) => {
                warn!("FTP: control write failed, dropping session");
                self.close_control();
                true
            }
        }
    }

    fn accept_control(&mut self) {
        let Some(listener) = self.control_listener.as_mut() else {
            return;
        };
        match listener.accept(0) {
            Ok(conn) => {
                debug!("FTP: accepted control connection at {}", self.clock.now_unix());
                self.control_conn = Some(conn);
                self.session = Some(Session::new());
                self.command_reader = CommandReader::new(self.config.command_buf);
                self.write_reply(220, "Paper Portal FTP Ready");
            }
            Err(Error::WouldBlock) => {}
            Err(err) => warn!("FTP: accept error: {err}"),
        }
    }

    fn transfer_is_active(&self) -> bool {
        matches!(
            self.session.as_ref().map(|s| &s.transfer),
            Some(Transfer::AwaitingData { .. })
                | Some(Transfer::Retr { .. })
                | Some(Transfer::Stor { .. })
                | Some(Transfer::List { .. })
                | Some(Transfer::Nlst { .. })
        )
    }

    /// One command line per tick; a live transfer's `150`..`226`/`550` span
    /// holds off further dispatch (spec §5's ordering guarantee), which
    /// falls out here from `tick` only ever calling this when no transfer
    /// is active.
    fn poll_command(&mut self) {
        let Some(conn) = self.control_conn.as_mut() else {
            return;
        };
        let line = match self.command_reader.poll_line(conn.as_mut()) {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(_) => {
                self.close_control();
                return;
            }
        };
        let Ok(text) = std::str::from_utf8(&line) else {
            self.write_reply(500, "Syntax error, command unrecognized.");
            return;
        };
        let cmd = commands::parse(text);
        let Some(mut session) = self.session.take() else {
            return;
        };
        // Field-projected borrows, not a `&mut self` helper method: a
        // method call's return value would be tied to a borrow of all of
        // `self`, which would then collide with the `&mut self.passive_pool`
        // borrow taken a few lines down.
        let net: &mut dyn NetAdapter = &mut **self.net.as_mut().expect("FtpServer::start must run before tick");
        let reply = commands::dispatch(
            &mut session,
            cmd,
            self.fs,
            net,
            &mut self.passive_pool,
            &self.config,
        );
        let closing = session.closing;
        self.session = Some(session);
        self.write_reply(reply.code, &reply.text);
        if closing {
            self.close_control();
        }
    }

    /// Advance the active transfer by exactly one step: one `accept`, one
    /// read/translate/write chunk, or one directory entry (spec §4.3).
    fn step_transfer(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let transfer = std::mem::replace(&mut session.transfer, Transfer::None);
        let ascii = session.transfer_type == TransferType::Ascii;

        match transfer {
            Transfer::AwaitingData { mut listener, op } => match listener.accept(0) {
                Ok(data_conn) => match op {
                    PendingOp::Retr { reader } => {
                        session.transfer = Transfer::Retr {
                            reader,
                            data: data_conn,
                            encoder: LineEndingEncoder::default(),
                            pending: Vec::new(),
                        };
                    }
                    PendingOp::Stor { writer } => {
                        session.transfer = Transfer::Stor {
                            writer,
                            data: data_conn,
                            decoder: LineEndingDecoder::default(),
                        };
                    }
                    PendingOp::List { path } => match self.fs.dir_open(&path) {
                        Ok(iter) => {
                            session.transfer = Transfer::List {
                                iter,
                                data: data_conn,
                                pending: Vec::new(),
                            }
                        }
                        Err(err) => {
                            let r = err.to_ftp_reply();
                            self.session = Some(session);
                            self.write_reply(r.0, r.1);
                            return;
                        }
                    },
                    PendingOp::Nlst { path } => match self.fs.dir_open(&path) {
                        Ok(iter) => {
                            session.transfer = Transfer::Nlst {
                                iter,
                                data: data_conn,
                                pending: Vec::new(),
                            }
                        }
                        Err(err) => {
                            let r = err.to_ftp_reply();
                            self.session = Some(session);
                            self.write_reply(r.0, r.1);
                            return;
                        }
                    },
                },
                Err(Error::WouldBlock) => {
                    session.transfer = Transfer::AwaitingData { listener, op };
                }
                Err(_) => {
                    self.session = Some(session);
                    self.write_reply(425, "Can't open data connection.");
                    return;
                }
            },
            Transfer::Retr {
                mut reader,
                mut data,
                mut encoder,
                mut pending,
            } => {
                if pending.is_empty() {
                    let mut buf = vec![0u8; self.config.transfer_buf];
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(226, "Transfer complete.");
                            return;
                        }
                        Ok(n) => {
                            pending = if ascii {
                                let mut translated = Vec::with_capacity(n + n / 32);
                                encoder.encode(&buf[..n], &mut translated);
                                translated
                            } else {
                                buf[..n].to_vec()
                            };
                        }
                        Err(_) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(550, "I/O error during transfer.");
                            return;
                        }
                    }
                }
                match write_some(data.as_mut(), &pending, DATA_TIMEOUT_MS) {
                    Ok(WriteOutcome::Done) => {
                        session.transfer = Transfer::Retr {
                            reader,
                            data,
                            encoder,
                            pending: Vec::new(),
                        };
                    }
                    Ok(WriteOutcome::Pending(rest)) => {
                        session.transfer = Transfer::Retr {
                            reader,
                            data,
                            encoder,
                            pending: rest,
                        };
                    }
                    Err(_) => {
                        data.close();
                        self.session = Some(session);
                        self.write_reply(426, "Connection closed; transfer aborted.");
                        return;
                    }
                }
            }
            Transfer::Stor {
                mut writer,
                mut data,
                mut decoder,
            } => {
                let mut buf = vec![0u8; self.config.transfer_buf];
                match data.recv(&mut buf, DATA_TIMEOUT_MS) {
                    Ok(0) => {
                        let mut tail = Vec::new();
                        decoder.finish(&mut tail);
                        if !tail.is_empty() {
                            let _ = write_to_writer(writer.as_mut(), &tail);
                        }
                        data.close();
                        self.session = Some(session);
                        self.write_reply(226, "Transfer complete.");
                        return;
                    }
                    Ok(n) => {
                        let input = if ascii {
                            let mut translated = Vec::with_capacity(n);
                            decoder.decode(&buf[..n], &mut translated);
                            translated
                        } else {
                            buf[..n].to_vec()
                        };
                        if let Err(err) = write_to_writer(writer.as_mut(), &input) {
                            self.session = Some(session);
                            let r = err.to_ftp_reply();
                            self.write_reply(r.0, r.1);
                            return;
                        }
                        session.transfer = Transfer::Stor { writer, data, decoder };
                    }
                    Err(Error::WouldBlock) => {
                        session.transfer = Transfer::Stor { writer, data, decoder };
                    }
                    Err(_) => {
                        self.session = Some(session);
                        self.write_reply(426, "Connection closed; transfer aborted.");
                        return;
                    }
                }
            }
            Transfer::List { mut iter, mut data, mut pending } => {
                if pending.is_empty() {
                    match iter.next() {
                        Ok(Some(entry)) => pending = format!("{}\r\n", format_list_entry(&entry)).into_bytes(),
                        Ok(None) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(226, "Transfer complete.");
                            return;
                        }
                        Err(_) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(550, "I/O error during listing.");
                            return;
                        }
                    }
                }
                match write_some(data.as_mut(), &pending, DATA_TIMEOUT_MS) {
                    Ok(WriteOutcome::Done) => {
                        session.transfer = Transfer::List { iter, data, pending: Vec::new() };
                    }
                    Ok(WriteOutcome::Pending(rest)) => {
                        session.transfer = Transfer::List { iter, data, pending: rest };
                    }
                    Err(_) => {
                        data.close();
                        self.session = Some(session);
                        self.write_reply(426, "Connection closed; transfer aborted.");
                        return;
                    }
                }
            }
            Transfer::Nlst { mut iter, mut data, mut pending } => {
                if pending.is_empty() {
                    match iter.next() {
                        Ok(Some(entry)) => pending = format!("{}\r\n", format_nlst_entry(&entry)).into_bytes(),
                        Ok(None) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(226, "Transfer complete.");
                            return;
                        }
                        Err(_) => {
                            data.close();
                            self.session = Some(session);
                            self.write_reply(550, "I/O error during listing.");
                            return;
                        }
                    }
                }
                match write_some(data.as_mut(), &pending, DATA_TIMEOUT_MS) {
                    Ok(WriteOutcome::Done) => {
                        session.transfer = Transfer::Nlst { iter, data, pending: Vec::new() };
                    }
                    Ok(WriteOutcome::Pending(rest)) => {
                        session.transfer = Transfer::Nlst { iter, data, pending: rest };
                    }
                    Err(_) => {
                        data.close();
                        self.session = Some(session);
                        self.write_reply(426, "Connection closed; transfer aborted.");
                        return;
                    }
                }
            }
            other => session.transfer = other,
        }

        self.session = Some(session);
    }
}

enum WriteOutcome {
    Done,
    /// `WouldBlock` mid-write; the caller re-arms its state with these
    /// unsent bytes instead of treating the write as failed (spec §7).
    Pending(Vec<u8>),
}

fn write_some(conn: &mut dyn Connection, mut data: &[u8], timeout_ms: u64) -> crate::error::Result<WriteOutcome> {
    while !data.is_empty() {
        match conn.send(data, timeout_ms) {
            Ok(0) => return Err(Error::Closed),
            Ok(n) => data = &data[n..],
            Err(Error::WouldBlock) => return Ok(WriteOutcome::Pending(data.to_vec())),
            Err(err) => return Err(err),
        }
    }
    Ok(WriteOutcome::Done)
}

fn write_to_writer(writer: &mut dyn crate::adapters::fs::Writer, mut data: &[u8]) -> crate::error::Result<()> {
    while !data.is_empty() {
        let n = writer.write(data)?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "short write")));
        }
        data = &data[n..];
    }
    Ok(())
}

impl<'a> Tickable for FtpServer<'a> {
    fn tick(&mut self, _now_ms: u64) {
        if !self.running {
            return;
        }
        if !self.flush_pending_reply() {
            return;
        }
        if self.control_conn.is_none() {
            self.accept_control();
            return;
        }
        if self.transfer_is_active() {
            self.step_transfer();
            return;
        }
        self.poll_command();
    }
}
