//! Crate-wide error taxonomy (spec §7).
//!
//! Mirrors the shape of `dav-server`'s `DavError`: a flat enum with a
//! `status()`-style mapping method, except here there are two mappings
//! (one per protocol) since a single engine serves both.

use std::fmt;

/// A three-digit FTP reply code plus its canned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpReply(pub u16, pub &'static str);

/// An HTTP status line's numeric code plus reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatus(pub u16, pub &'static str);

/// The full error taxonomy from spec §7.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid path")]
    InvalidPath,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    Exists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("is a directory")]
    IsDir,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("would block")]
    WouldBlock,
    #[error("connection closed")]
    Closed,
    #[error("bad request")]
    BadRequest,
    #[error("request line or headers too long")]
    LineTooLong,
    #[error("malformed chunked encoding")]
    BadChunkedEncoding,
    #[error("peer closed mid-frame")]
    UnexpectedEndOfStream,
    #[error("rename not supported across devices")]
    CrossDevice,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map a filesystem/path error onto the FTP reply-code policy of spec §7.
    pub fn to_ftp_reply(&self) -> FtpReply {
        match self {
            Error::InvalidPath => FtpReply(550, "Invalid path."),
            Error::NotFound => FtpReply(550, "No such file or directory."),
            Error::Exists => FtpReply(550, "Already exists."),
            Error::NotEmpty => FtpReply(550, "Directory not empty."),
            Error::IsDir => FtpReply(550, "Is a directory."),
            Error::Io(_) => FtpReply(550, "I/O error."),
            Error::CrossDevice => FtpReply(550, "Cannot rename across devices."),
            Error::WouldBlock => FtpReply(426, "Connection closed; transfer aborted."),
            Error::Closed | Error::UnexpectedEndOfStream => {
                FtpReply(426, "Connection closed; transfer aborted.")
            }
            Error::BadRequest | Error::LineTooLong | Error::BadChunkedEncoding => {
                FtpReply(502, "Command not implemented.")
            }
        }
    }

    /// Map a filesystem/path error onto the HTTP status policy of spec §7.
    ///
    /// Path-layer errors map to 400/409 "at the WebDAV layer's discretion" per
    /// spec §7; this engine picks 400 for `InvalidPath` and 409 for the
    /// filesystem-semantic conflicts (`Exists`/`NotEmpty`), which is the
    /// conventional WebDAV choice and matches RFC 4918 9.3.1's MKCOL table
    /// that the teacher's `handle_mkcol` implements.
    pub fn to_http_status(&self) -> HttpStatus {
        match self {
            Error::InvalidPath => HttpStatus(400, "Bad Request"),
            Error::NotFound => HttpStatus(404, "Not Found"),
            Error::Exists => HttpStatus(409, "Conflict"),
            Error::NotEmpty => HttpStatus(409, "Conflict"),
            Error::IsDir => HttpStatus(409, "Conflict"),
            Error::Io(_) => HttpStatus(500, "Internal Server Error"),
            Error::CrossDevice => HttpStatus(409, "Conflict"),
            Error::WouldBlock => HttpStatus(500, "Internal Server Error"),
            Error::Closed | Error::UnexpectedEndOfStream => HttpStatus(400, "Bad Request"),
            Error::BadRequest => HttpStatus(400, "Bad Request"),
            Error::LineTooLong => HttpStatus(431, "Request Header Fields Too Large"),
            Error::BadChunkedEncoding => HttpStatus(400, "Bad Request"),
        }
    }

    /// Framing errors and unexpected end-of-stream always close the connection.
    pub fn must_close(&self) -> bool {
        matches!(
            self,
            Error::BadRequest
                | Error::LineTooLong
                | Error::BadChunkedEncoding
                | Error::UnexpectedEndOfStream
                | Error::Closed
        )
    }
}

impl fmt::Display for FtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftp_mapping_covers_not_found() {
        assert_eq!(Error::NotFound.to_ftp_reply().0, 550);
    }

    #[test]
    fn http_mapping_marks_close_on_framing_errors() {
        assert!(Error::BadRequest.must_close());
        assert!(!Error::NotFound.must_close());
    }
}
