//! Filesystem adapter contract (spec §4.2).
//!
//! Grounded on the teacher's `DavFileSystem`/`DavFile`/`DavDirEntry`/
//! `DavMetaData` traits (`fs/localfs.rs`), collapsed from `async fn`
//! returning boxed futures into plain blocking methods — spec §4.2/§9 calls
//! for a synchronous capability set taken by reference at server
//! construction, not an async trait object.

use crate::error::{Error, Result};

/// Metadata returned by `stat`.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub size: u64,
    pub is_dir: bool,
    pub mtime: Option<i64>,
}

/// One entry produced by a directory iterator.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub mtime: Option<i64>,
}

/// Opaque handle to an open file for reading.
pub trait Reader {
    /// Read up to `buf.len()` bytes. Returns 0 at EOF.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Opaque handle to an open file for writing.
pub trait Writer {
    /// Write as many bytes of `buf` as possible, returning the count written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
}

/// Opaque handle to an open directory iterator.
pub trait DirIter {
    /// Produce the next entry, or `Ok(None)` at end of the stream.
    /// `.` and `..` are never yielded.
    fn next(&mut self) -> Result<Option<Entry>>;
}

/// The capability set the engine consumes from the host filesystem,
/// operating entirely on virtual paths (the adapter owns virtual-to-host
/// translation and the fixed root prefix).
pub trait FsAdapter {
    fn stat(&self, path: &str) -> Result<Stat>;

    fn open_read(&self, path: &str) -> Result<Box<dyn Reader + '_>>;
    fn open_write_trunc(&self, path: &str) -> Result<Box<dyn Writer + '_>>;

    fn dir_open(&self, path: &str) -> Result<Box<dyn DirIter + '_>>;

    fn delete(&self, path: &str) -> Result<()>;
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    fn make_dir(&self, path: &str) -> Result<()>;
    fn remove_dir(&self, path: &str) -> Result<()>;

    fn file_size(&self, path: &str) -> Result<u64> {
        Ok(self.stat(path)?.size)
    }

    fn file_mtime(&self, path: &str) -> Result<i64> {
        self.stat(path)?.mtime.ok_or(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no mtime available",
        )))
    }
}
