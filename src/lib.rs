//! ## Embedded FTP + WebDAV file-server engine
//!
//! This crate is the guest-side engine behind an e-paper appliance's
//! "File Server" feature: a single-client, non-blocking, static-buffer
//! server that speaks a subset of FTP (RFC 959) and HTTP/1.1 (carrying
//! WebDAV) over host-provided sockets. It owns its own wire framing — there
//! is no `tokio`, no `hyper`/`warp`/`actix`, no thread pool underneath it —
//! because the device it runs on has none of those available. Everything
//! advances through one entrypoint, [`server::Tickable::tick`], called
//! cooperatively by the host roughly every 33 ms.
//!
//! ## Backend interfaces.
//!
//! Like the library this one grew out of, I/O is behind small adapter
//! traits the host implements:
//!
//! - a [network adapter][adapters::NetAdapter] — listen/accept/recv/send
//!   with explicit millisecond timeouts.
//! - a [filesystem adapter][adapters::FsAdapter] — open/read/write/stat/
//!   rename/mkdir/rmdir over virtual, chrooted paths.
//! - a [clock adapter][adapters::ClockAdapter] — UTC seconds, or 0 with no
//!   RTC present.
//!
//! The `stdfs` feature (on by default) supplies `std::fs`/`std::net`-backed
//! implementations of all three, suitable for host binaries and integration
//! tests; [`adapters::memfs`]/[`adapters::memnet`] supply in-memory ones for
//! hermetic unit tests.
//!
//! ## What's in scope.
//!
//! - [`ftp::FtpServer`]: the FTP control/data state machine — USER/PASS
//!   login, CWD/PWD/CDUP, PASV + LIST/NLST/RETR/STOR, DELE/MKD/RMD/RNFR/RNTO,
//!   SIZE/MDTM, ASCII/binary type translation.
//! - [`http::HttpServer`]: HTTP/1.1 framing (request-line + header parsing,
//!   `Content-Length`/chunked request bodies, chunked response encoding,
//!   keep-alive) plus the plain-file methods (GET/HEAD/PUT/DELETE/MKCOL/
//!   OPTIONS) needed to serve a filesystem over the wire.
//! - [`dav::DavMethodHandler`]: the seam where a full WebDAV XML stack
//!   (PROPFIND/PROPPATCH/LOCK/UNLOCK/COPY/MOVE) plugs in; this crate ships
//!   only [`dav::UnimplementedDav`], a `501`-everything stub, since that
//!   marshalling is a pre-existing dependency this engine merely calls into.
//! - [`path`]: the sandboxed virtual-to-host path layer both protocols share.
//!
//! Deliberately out of scope: multi-client concurrency, TLS, any
//! authentication beyond a single static FTP user/password, persistent
//! configuration, and the host ABI / UI scene / gesture handling that embeds
//! this engine on the device.
//!
//! ## Example.
//!
//! ```no_run
//! use paper_portal_fs::adapters::{StdFsAdapter, StdNetAdapter, SystemClock};
//! use paper_portal_fs::config::FtpConfig;
//! use paper_portal_fs::ftp::FtpServer;
//! use paper_portal_fs::server::Tickable;
//!
//! let fs = StdFsAdapter::new();
//! let clock = SystemClock;
//! let mut net = StdNetAdapter::default();
//! let mut ftp = FtpServer::new(FtpConfig::default(), &fs, &clock);
//! ftp.start(&mut net).unwrap();
//! loop {
//!     ftp.tick(0);
//!     # break;
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod dav;
pub mod error;
pub mod ftp;
pub mod http;
pub mod path;
pub mod server;

pub use error::{Error, Result};
pub use server::Tickable;
