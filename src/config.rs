//! Server configuration (spec §6 "Credentials", §9 "Passive-port rotation").
//!
//! Grounded on the teacher's `DavBuilder` (`davhandler/mod.rs`): a `Clone`
//! configuration struct assembled with a fluent builder and consumed once
//! at server construction.

/// Minimum sizes for the four fixed connection buffers (spec §3).
pub const MIN_COMMAND_BUF: usize = 1024;
pub const MIN_REPLY_BUF: usize = 1024;
pub const MIN_TRANSFER_BUF: usize = 8192;
pub const MIN_SCRATCH_BUF: usize = 1024;
/// HTTP request-line + header block cap (spec §4.4).
pub const HTTP_HEADER_CAP: usize = 16 * 1024;
/// Max number of HTTP header entries (spec §3).
pub const HTTP_MAX_HEADERS: usize = 64;

#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub user: String,
    pub password: String,
    pub control_port: u16,
    pub pasv_port_range: (u16, u16),
    pub command_buf: usize,
    pub reply_buf: usize,
    pub transfer_buf: usize,
    pub scratch_buf: usize,
}

impl Default for FtpConfig {
    fn default() -> Self {
        FtpConfig {
            user: "paper".to_string(),
            password: "paper".to_string(),
            control_port: 21,
            pasv_port_range: (50000, 50100),
            command_buf: MIN_COMMAND_BUF,
            reply_buf: MIN_REPLY_BUF,
            transfer_buf: MIN_TRANSFER_BUF,
            scratch_buf: MIN_SCRATCH_BUF,
        }
    }
}

impl FtpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn control_port(mut self, port: u16) -> Self {
        self.control_port = port;
        self
    }

    pub fn pasv_port_range(mut self, lo: u16, hi: u16) -> Self {
        self.pasv_port_range = (lo, hi);
        self
    }

    pub fn transfer_buf_size(mut self, size: usize) -> Self {
        self.transfer_buf = size.max(MIN_TRANSFER_BUF);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen_port: u16,
    pub transfer_buf: usize,
    pub scratch_buf: usize,
    pub server_header: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen_port: 8080,
            transfer_buf: MIN_TRANSFER_BUF,
            scratch_buf: MIN_SCRATCH_BUF,
            server_header: "Paper Portal".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    pub fn transfer_buf_size(mut self, size: usize) -> Self {
        self.transfer_buf = size.max(MIN_TRANSFER_BUF);
        self
    }
}
