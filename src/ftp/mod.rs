//! FTP (RFC 959 subset) server variant (spec §4.3, §4.5).

pub mod ascii;
pub mod commands;
pub mod dirlist;
pub mod framing;
pub mod passive;
pub mod server;
pub mod session;

pub use commands::Command;
pub use server::FtpServer;
pub use session::Session;
