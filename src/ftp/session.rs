//! FTP session state (spec §3 "Session (FTP)", §4.3, §9 "State-machine
//! encoding").
//!
//! No teacher analogue (the teacher is stateless per-request WebDAV); built
//! as the tagged-variant encoding spec §9 recommends explicitly, so "at
//! most one transfer handle is live" falls out of the `Transfer` enum's
//! shape instead of being an invariant callers have to maintain by hand.

use crate::adapters::fs::{DirIter, Reader, Writer};
use crate::adapters::net::{Connection, Listener};
use crate::ftp::ascii::{LineEndingDecoder, LineEndingEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl Default for TransferType {
    fn default() -> Self {
        TransferType::Binary
    }
}

/// `unauth -> user_supplied -> authenticated` (spec §4.3).
pub enum AuthState {
    Unauth,
    UserSupplied { user: String },
    Authenticated,
}

/// What a data connection will be used for once accepted, for the
/// commands (`RETR`/`STOR`) that open their filesystem handle *before* the
/// data connection exists, versus the ones (`LIST`/`NLST`) that open it
/// lazily once the connection is in hand (spec §4.3 "Listing").
pub enum PendingOp<'a> {
    Retr { reader: Box<dyn Reader + 'a> },
    Stor { writer: Box<dyn Writer + 'a> },
    List { path: String },
    Nlst { path: String },
}

/// The single outstanding transfer handle variant (spec §3, §9). At most
/// one of these is live at a time by construction — assigning a new
/// variant always replaces (and thereby drops/closes) whatever was there.
pub enum Transfer<'a> {
    None,
    /// Armed by `PASV`, not yet claimed by a transfer command.
    PassiveArmed { listener: Box<dyn Listener> },
    /// A transfer command has replied `150` and is waiting for the data
    /// connection to be accepted (spec §4.3's per-tick accept step).
    AwaitingData { listener: Box<dyn Listener>, op: PendingOp<'a> },
    Retr {
        reader: Box<dyn Reader + 'a>,
        data: Box<dyn Connection>,
        encoder: LineEndingEncoder,
        /// Bytes already read/translated but not yet flushed to `data`,
        /// left over from a `WouldBlock` on a previous tick's write.
        pending: Vec<u8>,
    },
    Stor {
        writer: Box<dyn Writer + 'a>,
        data: Box<dyn Connection>,
        decoder: LineEndingDecoder,
    },
    List {
        iter: Box<dyn DirIter + 'a>,
        data: Box<dyn Connection>,
        pending: Vec<u8>,
    },
    Nlst {
        iter: Box<dyn DirIter + 'a>,
        data: Box<dyn Connection>,
        pending: Vec<u8>,
    },
}

impl<'a> Transfer<'a> {
    pub fn is_none(&self) -> bool {
        matches!(self, Transfer::None)
    }
}

pub struct Session<'a> {
    pub auth: AuthState,
    pub cwd: String,
    pub transfer_type: TransferType,
    pub pending_rename_from: Option<String>,
    pub transfer: Transfer<'a>,
    pub closing: bool,
}

impl<'a> Session<'a> {
    pub fn new() -> Self {
        Session {
            auth: AuthState::Unauth,
            cwd: "/".to_string(),
            transfer_type: TransferType::Binary,
            pending_rename_from: None,
            transfer: Transfer::None,
            closing: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated)
    }
}

impl<'a> Default for Session<'a> {
    fn default() -> Self {
        Self::new()
    }
}
